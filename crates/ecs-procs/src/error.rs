/// Errors raised while fetching or decoding a single metadata document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] ureq::Error),

    #[error("request failed, status code: {0}")]
    Status(u16),

    #[error("read failed: {0}")]
    Read(#[source] ureq::Error),

    #[error("unmarshal failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request failed: deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no CPU limit found for task or container")]
    NoLimitFound,
}

/// Errors returned by [`set`](crate::set) and [`Controller`](crate::Controller).
///
/// Each variant names the stage that failed; the underlying cause stays
/// reachable through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no orchestration environment detected: {var} is not set")]
    NoOrchestrationEnvironment { var: String },

    #[error("failed to get container metadata: {0}")]
    ContainerMetadata(#[source] FetchError),

    #[error("failed to get task metadata: {0}")]
    TaskMetadata(#[source] FetchError),

    #[error("failed to resolve CPU limit: {0}")]
    Resolve(#[from] ResolveError),
}

impl Error {
    /// True when the process simply is not running under ECS.
    pub fn is_not_detected(&self) -> bool {
        matches!(self, Error::NoOrchestrationEnvironment { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn stage_labels_wrap_cause() {
        let err = Error::TaskMetadata(FetchError::Status(500));
        assert_eq!(
            err.to_string(),
            "failed to get task metadata: request failed, status code: 500"
        );
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "request failed, status code: 500");
    }

    #[test]
    fn resolve_error_message() {
        let err = Error::from(ResolveError::NoLimitFound);
        assert_eq!(
            err.to_string(),
            "failed to resolve CPU limit: no CPU limit found for task or container"
        );
        assert!(!err.is_not_detected());
    }

    #[test]
    fn not_detected_names_variable() {
        let err = Error::NoOrchestrationEnvironment {
            var: "ECS_CONTAINER_METADATA_URI_V4".into(),
        };
        assert!(err.is_not_detected());
        assert!(err.to_string().contains("ECS_CONTAINER_METADATA_URI_V4"));
    }
}
