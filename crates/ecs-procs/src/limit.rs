use std::num::NonZeroUsize;

use serde::Serialize;

use crate::error::ResolveError;
use crate::meta::{ContainerMeta, TaskMeta};

/// ECS container CPU units per whole vCPU.
pub const CPU_UNITS_PER_VCPU: f64 = 1024.0;

/// Which limit the resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum LimitSource {
    Container { cpu_units: f64 },
    Task { cpus: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    pub parallelism: NonZeroUsize,
    pub source: LimitSource,
}

/// Compute the parallelism for `container` within `task`.
///
/// The container's own limit, looked up in the task's container list by the
/// container endpoint's `DockerId`, takes precedence. It is converted from CPU
/// units and floored. Without it the task limit (already in vCPUs) is floored
/// instead. Either way the result is at least one. It is not checked against
/// the task limit.
pub fn resolve(container: &ContainerMeta, task: &TaskMeta) -> Result<Resolution, ResolveError> {
    let container_units = task
        .container(&container.docker_id)
        .map(|c| c.limits.cpu)
        .filter(|cpu| *cpu > 0.0);

    if let Some(cpu_units) = container_units {
        return Ok(Resolution {
            parallelism: whole_cpus(cpu_units / CPU_UNITS_PER_VCPU),
            source: LimitSource::Container { cpu_units },
        });
    }

    let cpus = task.limits.cpu;
    if cpus > 0.0 {
        return Ok(Resolution {
            parallelism: whole_cpus(cpus),
            source: LimitSource::Task { cpus },
        });
    }

    Err(ResolveError::NoLimitFound)
}

fn whole_cpus(cpus: f64) -> NonZeroUsize {
    // `as` saturates, so huge limits pin to usize::MAX rather than wrapping.
    NonZeroUsize::new(cpus.floor() as usize).unwrap_or(NonZeroUsize::MIN)
}
