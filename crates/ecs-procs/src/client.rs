use std::time::Instant;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::FetchError;

/// Fetch a metadata document as raw bytes.
pub trait Fetcher: Send + Sync {
    /// `deadline`, when set, caps the time spent on this request.
    fn get(&self, url: &str, deadline: Option<Instant>) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP client for the ECS agent.
pub struct MetadataClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl MetadataClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .timeout_connect(Some(config.connect_timeout))
            .timeout_recv_response(Some(config.response_timeout))
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .max_idle_age(config.idle_age)
            // Any non-200 is checked below, so keep the response instead of an error.
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self { agent, config }
    }
}

impl Default for MetadataClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Fetcher for MetadataClient {
    fn get(&self, url: &str, deadline: Option<Instant>) -> Result<Vec<u8>, FetchError> {
        let mut timeout = self.config.timeout;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(FetchError::DeadlineExceeded);
            }
            timeout = timeout.min(remaining);
        }

        debug!(url, timeout_ms = timeout.as_millis() as u64, "fetching metadata");

        let mut response = self
            .agent
            .get(url)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()
            .map_err(FetchError::Transport)?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(url, status, "metadata request rejected");
            return Err(FetchError::Status(status));
        }

        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(FetchError::Read)?;
        debug!(url, bytes = body.len(), "metadata received");
        Ok(body)
    }
}
