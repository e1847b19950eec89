//! Size process parallelism from Amazon ECS CPU limits.
//!
//! A container granted 2 of a host's 16 vCPUs should not spin up 16 worker
//! threads. This crate reads the ECS task metadata endpoint (v4), resolves the
//! container's CPU limit (falling back to the task's), and stores it as the
//! process parallelism that [`runtime::multi_thread`] and friends consume.
//!
//! # Example
//! ```no_run
//! let (undo, result) = ecs_procs::set(
//!     ecs_procs::Options::default().with_logger(|args| eprintln!("{args}")),
//! );
//! if let Err(e) = result {
//!     eprintln!("keeping default parallelism: {e}");
//! }
//! let runtime = ecs_procs::runtime::multi_thread().enable_all().build()?;
//! # drop(runtime);
//! undo.undo();
//! # Ok::<(), std::io::Error>(())
//! ```

mod client;
mod config;
mod env;
mod error;
mod limit;
mod meta;
mod parallelism;
mod procs;
pub mod runtime;
#[cfg(test)]
mod testing;

use std::num::NonZeroUsize;

use tracing::{debug, warn};

pub use client::{Fetcher, MetadataClient};
pub use config::{ClientConfig, Logger, METADATA_URI_ENV, OVERRIDE_ENV, Options};
pub use env::{Endpoints, discover};
pub use error::{Error, FetchError, ResolveError, Result};
pub use limit::{CPU_UNITS_PER_VCPU, LimitSource, Resolution, resolve};
pub use meta::{ContainerMeta, Limits, TaskMeta};
pub use parallelism::{AtomicParallelism, Parallelism, ProcessParallelism};
pub use procs::{Controller, Outcome, Undo};

/// Set the process parallelism from the ECS container and task CPU limits.
///
/// Returns a handle that restores the previous value together with the
/// result. The handle is usable even when the result is an error.
pub fn set(options: Options) -> (Undo, Result<Outcome>) {
    Controller::new(options).apply()
}

/// True when the ECS metadata endpoint variable is set.
pub fn is_detected() -> bool {
    discover(METADATA_URI_ENV).is_some()
}

/// Current process parallelism.
pub fn parallelism() -> NonZeroUsize {
    parallelism::current()
}

/// Best-effort [`set`] for program start. Logs through `tracing`, never fails.
pub fn init() {
    let options = Options {
        logger: Logger::tracing(),
        ..Options::default()
    };
    match set(options).1 {
        Ok(_) => {}
        Err(e) if e.is_not_detected() => debug!("{e}"),
        Err(e) => warn!(error = %e, "unable to size parallelism from ECS limits"),
    }
}
