//! Domain models for virtual machines and their disks.

use crate::core::domain::value_object::{
    ClusterId, IpAddressId, Vcpus, VirtualDiskId, VirtualMachineId,
};
use serde::{Deserialize, Serialize};

/// A virtual machine inventory record.
///
/// Resource attributes are optional; an absent value means "not declared",
/// which is different from zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VirtualMachine {
    pub id: VirtualMachineId,
    pub name: String,
    /// Owning cluster, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterId>,
    /// Allocated virtual CPUs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<Vcpus>,
    /// Memory in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    /// Disk in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_ip4: Option<IpAddressId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_ip6: Option<IpAddressId>,
}

/// A virtual disk attached to exactly one virtual machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VirtualDisk {
    pub id: VirtualDiskId,
    pub virtual_machine: VirtualMachineId,
    pub name: String,
    /// Size in MB.
    pub size: u32,
}
