//! Environment discovery for the ECS metadata endpoint.

const TASK_PATH: &str = "/task";

/// Container- and task-scoped metadata URLs derived from the base URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub container: String,
    pub task: String,
}

impl Endpoints {
    /// The base URI is the container endpoint; the task endpoint hangs off it.
    /// Malformed URIs are passed through and surface as fetch errors.
    pub fn from_base(base: &str) -> Self {
        Self {
            container: base.to_string(),
            task: format!("{base}{TASK_PATH}"),
        }
    }
}

/// Read the metadata base URI from `var`. Unset or empty means "not on ECS".
pub fn metadata_uri(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|uri| !uri.is_empty())
}

pub fn discover(var: &str) -> Option<Endpoints> {
    metadata_uri(var).map(|base| Endpoints::from_base(&base))
}

/// The operator override, if the variable is present at all (even empty).
pub fn override_value(var: &str) -> Option<String> {
    std::env::var_os(var).map(|v| v.to_string_lossy().into_owned())
}
