//! Rollups computed across a cluster's members.

use crate::core::domain::value_object::Vcpus;
use serde::Serialize;

/// Resource sums across the virtual machines of a cluster.
///
/// A field is `None` when no member VM declares a value for it; otherwise it
/// is the sum of the declared values only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<Vcpus>,
    /// Memory in MB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Disk in MB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
}

/// Number of devices and virtual machines assigned to a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClusterMemberCounts {
    pub device_count: usize,
    pub vm_count: usize,
}

/// Number of interfaces and disks attached to a virtual machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComponentCounts {
    pub interface_count: usize,
    pub disk_count: usize,
}
