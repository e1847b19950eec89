//! ECS task metadata endpoint v4 documents.
//!
//! Only the fields needed to size parallelism are modelled; everything else
//! in the agent's response is ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Container documents use 1024ths of a vCPU; task documents use whole vCPUs.
    #[serde(rename = "CPU", default)]
    pub cpu: f64,
    #[serde(
        rename = "Memory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub memory: Option<f64>,
}

/// Response of `GET ${ECS_CONTAINER_METADATA_URI_V4}`, and each entry of the
/// task document's container list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerMeta {
    // The agent spells this one field differently from the rest.
    #[serde(rename = "DockerId", default)]
    pub docker_id: String,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Limits", default)]
    pub limits: Limits,
}

/// Response of `GET ${ECS_CONTAINER_METADATA_URI_V4}/task`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    #[serde(rename = "TaskARN", default, skip_serializing_if = "Option::is_none")]
    pub task_arn: Option<String>,
    #[serde(rename = "Family", default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(rename = "Containers", default)]
    pub containers: Vec<ContainerMeta>,
    /// Optional for tasks hosted on EC2 instances.
    #[serde(rename = "Limits", default)]
    pub limits: Limits,
}

impl TaskMeta {
    pub fn container(&self, docker_id: &str) -> Option<&ContainerMeta> {
        if docker_id.is_empty() {
            return None;
        }
        self.containers.iter().find(|c| c.docker_id == docker_id)
    }
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FetchError> {
    Ok(serde_json::from_slice(bytes)?)
}
