//! RunPod provider module.
//!
//! Typed records for pods, templates and network volumes, and the
//! [`InstanceProvider`] trait with its REST implementation.

mod client;
#[cfg(test)]
pub(crate) mod fake;
mod types;

pub use client::{InstanceProvider, ProviderError, RunPodClient};
pub use types::{
    CreateInstanceRequest, CreatedInstance, DEFAULT_CONTAINER_DISK_GB, DEFAULT_PORTS, GpuInfo,
    Instance, InstanceStatus, MachineInfo, RuntimeInfo, StringOrList, Template, Volume, short_id,
};
