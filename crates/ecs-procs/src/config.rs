use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Environment variable holding the ECS task metadata endpoint v4 base URI.
pub const METADATA_URI_ENV: &str = "ECS_CONTAINER_METADATA_URI_V4";

/// Environment variable an operator sets to pin the worker thread count.
/// Tokio reads the same variable when building a multi-thread runtime.
pub const OVERRIDE_ENV: &str = "TOKIO_WORKER_THREADS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_IDLE_AGE: Duration = Duration::from_secs(1);

type LogFn = dyn Fn(fmt::Arguments<'_>) + Send + Sync;

/// Printf-style log sink for lifecycle messages. No-op unless configured.
#[derive(Clone, Default)]
pub struct Logger(Option<Arc<LogFn>>);

impl Logger {
    pub fn new(f: impl Fn(fmt::Arguments<'_>) + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(f)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    /// Forward messages to `tracing` at info level.
    pub fn tracing() -> Self {
        Self::new(|args| tracing::info!("{args}"))
    }

    pub fn log(&self, args: fmt::Arguments<'_>) {
        if let Some(f) = &self.0 {
            f(args);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Logger")
            .field(&if self.0.is_some() { "custom" } else { "noop" })
            .finish()
    }
}

/// HTTP tuning for the metadata agent. The endpoint is link-local, so every
/// timeout stays short and connections are not kept around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub max_idle_connections: usize,
    pub max_idle_connections_per_host: usize,
    pub idle_age: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            max_idle_connections: 1,
            max_idle_connections_per_host: 1,
            idle_age: DEFAULT_IDLE_AGE,
        }
    }
}

/// Options accepted by [`set`](crate::set) and [`Controller::new`](crate::Controller::new).
#[derive(Debug, Clone)]
pub struct Options {
    pub logger: Logger,
    pub client: ClientConfig,
    /// Upper bound for the whole resolution (both fetches).
    pub deadline: Option<Instant>,
    pub metadata_uri_env: String,
    pub override_env: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            logger: Logger::noop(),
            client: ClientConfig::default(),
            deadline: None,
            metadata_uri_env: METADATA_URI_ENV.to_string(),
            override_env: OVERRIDE_ENV.to_string(),
        }
    }
}

impl Options {
    pub fn with_logger(mut self, f: impl Fn(fmt::Arguments<'_>) + Send + Sync + 'static) -> Self {
        self.logger = Logger::new(f);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client.timeout = timeout;
        self
    }

    pub fn with_metadata_uri_env(mut self, var: impl Into<String>) -> Self {
        self.metadata_uri_env = var.into();
        self
    }

    pub fn with_override_env(mut self, var: impl Into<String>) -> Self {
        self.override_env = var.into();
        self
    }
}
