use tokio::runtime::Builder;

use crate::parallelism;

/// A multi-thread tokio runtime builder with one worker per resolved CPU.
///
/// Call after [`set`](crate::set) or [`init`](crate::init) so the limit is
/// already applied.
pub fn multi_thread() -> Builder {
    let mut builder = Builder::new_multi_thread();
    builder.worker_threads(parallelism::current().get());
    builder
}
