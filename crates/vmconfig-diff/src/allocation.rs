//! CPU and memory allocation (reservation and limit)
//!
//! Desired quantities are converted to platform units before comparison, and
//! reservation and limit are decided independently: the emitted allocation
//! carries only the fields that differ.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::debug;
use vmconfig_common::model::{ResourceAllocation, ResourcePolicy};
use vmconfig_common::quantity::{
    cpu_quantity_to_mhz, memory_quantity_to_mb, requested_quantity, ParsedQuantity,
};
use vmconfig_common::Result;

/// Diff the CPU allocation; quantities become MHz against `min_cpu_freq_mhz`
pub fn diff_cpu_allocation(
    live: Option<&ResourceAllocation>,
    policy: &ResourcePolicy,
    min_cpu_freq_mhz: u64,
) -> Result<Option<ResourceAllocation>> {
    let to_mhz = |field: &str, q: &ParsedQuantity| cpu_quantity_to_mhz(field, q, min_cpu_freq_mhz);
    let reservation = convert("policies.requests.cpu", policy.requests.cpu.as_ref(), to_mhz)?;
    let limit = convert("policies.limits.cpu", policy.limits.cpu.as_ref(), to_mhz)?;
    Ok(allocation_delta("cpu", live, reservation, limit))
}

/// Diff the memory allocation; quantities become MB
pub fn diff_memory_allocation(
    live: Option<&ResourceAllocation>,
    policy: &ResourcePolicy,
) -> Result<Option<ResourceAllocation>> {
    let reservation = convert(
        "policies.requests.memory",
        policy.requests.memory.as_ref(),
        memory_quantity_to_mb,
    )?;
    let limit = convert(
        "policies.limits.memory",
        policy.limits.memory.as_ref(),
        memory_quantity_to_mb,
    )?;
    Ok(allocation_delta("memory", live, reservation, limit))
}

fn convert<F>(field: &str, quantity: Option<&Quantity>, to_units: F) -> Result<Option<i64>>
where
    F: Fn(&str, &ParsedQuantity) -> Result<i64>,
{
    requested_quantity(field, quantity)?
        .map(|q| to_units(field, &q))
        .transpose()
}

fn allocation_delta(
    resource: &str,
    live: Option<&ResourceAllocation>,
    reservation: Option<i64>,
    limit: Option<i64>,
) -> Option<ResourceAllocation> {
    let current = live.copied().unwrap_or_default();
    let delta = ResourceAllocation {
        reservation: reservation.filter(|r| current.reservation != Some(*r)),
        limit: limit.filter(|l| current.limit != Some(*l)),
    };

    if delta.is_empty() {
        return None;
    }
    debug!(
        resource,
        reservation = ?delta.reservation,
        limit = ?delta.limit,
        "allocation changed"
    );
    Some(delta)
}
