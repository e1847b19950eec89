use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{Fetcher, MetadataClient};
use crate::config::{Logger, Options};
use crate::env;
use crate::error::{Error, FetchError, Result};
use crate::limit::{self, LimitSource, Resolution};
use crate::meta::{self, ContainerMeta, TaskMeta};
use crate::parallelism::{Parallelism, ProcessParallelism};

/// Serializes read-modify-write of the parallelism setting across callers.
static APPLY_LOCK: Mutex<()> = Mutex::new(());

fn apply_lock() -> MutexGuard<'static, ()> {
    APPLY_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a successful [`Controller::apply`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The override variable was set and nothing was fetched. A numeric value
    /// is stored as the setting.
    Honored { var: String, value: String },
    Updated {
        previous: NonZeroUsize,
        current: NonZeroUsize,
        source: LimitSource,
    },
}

/// Restores the parallelism captured before [`Controller::apply`].
///
/// Safe to call whether or not `apply` succeeded, and any number of times.
#[derive(Clone)]
pub struct Undo {
    restore: Option<Restore>,
    logger: Logger,
}

#[derive(Clone)]
struct Restore {
    previous: NonZeroUsize,
    parallelism: Arc<dyn Parallelism>,
}

impl Undo {
    fn noop(logger: Logger) -> Self {
        Self {
            restore: None,
            logger,
        }
    }

    /// The value this handle restores, `None` for the no-op handle.
    pub fn previous(&self) -> Option<NonZeroUsize> {
        self.restore.as_ref().map(|r| r.previous)
    }

    /// The logger runs after the setting is restored and the lock released.
    pub fn undo(&self) {
        match &self.restore {
            Some(restore) => {
                {
                    let _guard = apply_lock();
                    restore.parallelism.set(restore.previous);
                }
                self.logger.log(format_args!(
                    "ecs-procs: Resetting parallelism to {}",
                    restore.previous
                ));
            }
            None => self
                .logger
                .log(format_args!("ecs-procs: No parallelism change to reset")),
        }
    }
}

impl fmt::Debug for Undo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undo")
            .field("previous", &self.previous())
            .finish()
    }
}

/// Discovers the ECS limits and applies them to a [`Parallelism`].
pub struct Controller {
    options: Options,
    fetcher: Arc<dyn Fetcher>,
    parallelism: Arc<dyn Parallelism>,
}

impl Controller {
    /// Controller bound to the process-wide setting and a real HTTP client.
    pub fn new(options: Options) -> Self {
        let fetcher = Arc::new(MetadataClient::new(options.client.clone()));
        Self::with_parts(options, fetcher, Arc::new(ProcessParallelism))
    }

    pub fn with_parts(
        options: Options,
        fetcher: Arc<dyn Fetcher>,
        parallelism: Arc<dyn Parallelism>,
    ) -> Self {
        Self {
            options,
            fetcher,
            parallelism,
        }
    }

    pub fn is_detected(&self) -> bool {
        env::discover(&self.options.metadata_uri_env).is_some()
    }

    /// Fetch both documents and resolve the limit without applying it.
    pub fn resolve(&self) -> Result<Resolution> {
        let endpoints = env::discover(&self.options.metadata_uri_env).ok_or_else(|| {
            Error::NoOrchestrationEnvironment {
                var: self.options.metadata_uri_env.clone(),
            }
        })?;

        let container: ContainerMeta = self
            .fetch(&endpoints.container)
            .map_err(Error::ContainerMetadata)?;
        let task: TaskMeta = self.fetch(&endpoints.task).map_err(Error::TaskMetadata)?;

        let resolution = limit::resolve(&container, &task)?;
        debug!(
            docker_id = %container.docker_id,
            parallelism = resolution.parallelism.get(),
            source = ?resolution.source,
            "resolved CPU limit"
        );
        Ok(resolution)
    }

    /// Resolve and apply the limit.
    ///
    /// The returned [`Undo`] is valid on every path. On error the setting is
    /// left untouched. An override that parses as a thread count is stored as
    /// the new setting. Log messages are emitted after the lock is released,
    /// so the logger may call back into this crate.
    pub fn apply(&self) -> (Undo, Result<Outcome>) {
        let logger = &self.options.logger;
        let var = &self.options.override_env;

        if let Some(value) = env::override_value(var) {
            let undo = self.honor(&value);
            logger.log(format_args!(
                "ecs-procs: Honoring {var}={value:?} as set in environment"
            ));
            let outcome = Outcome::Honored {
                var: var.clone(),
                value,
            };
            return (undo, Ok(outcome));
        }

        let (undo, result) = self.apply_limit();
        match &result {
            Ok(Outcome::Updated { current, .. }) => {
                logger.log(format_args!("ecs-procs: Updating parallelism={current}"));
            }
            Ok(Outcome::Honored { .. }) => {}
            Err(e) => logger.log(format_args!("ecs-procs: Failed to set parallelism: {e}")),
        }
        (undo, result)
    }

    /// Store a numeric override. Values that don't parse are left for the
    /// runtime to interpret and nothing changes.
    fn honor(&self, value: &str) -> Undo {
        let noop = Undo::noop(self.options.logger.clone());
        let Ok(pinned) = value.trim().parse::<NonZeroUsize>() else {
            return noop;
        };

        let _guard = apply_lock();
        let previous = self.parallelism.get();
        if previous == pinned {
            return noop;
        }
        self.parallelism.set(pinned);
        self.restoring(previous)
    }

    fn apply_limit(&self) -> (Undo, Result<Outcome>) {
        let _guard = apply_lock();

        let previous = self.parallelism.get();
        let undo = self.restoring(previous);

        let resolution = match self.resolve() {
            Ok(resolution) => resolution,
            Err(e) => return (undo, Err(e)),
        };

        let current = resolution.parallelism;
        self.parallelism.set(current);

        let outcome = Outcome::Updated {
            previous,
            current,
            source: resolution.source,
        };
        (undo, Ok(outcome))
    }

    fn restoring(&self, previous: NonZeroUsize) -> Undo {
        Undo {
            restore: Some(Restore {
                previous,
                parallelism: Arc::clone(&self.parallelism),
            }),
            logger: self.options.logger.clone(),
        }
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, FetchError> {
        let body = self.fetcher.get(url, self.options.deadline)?;
        meta::decode(&body)
    }
}
