//! Domain models for cluster types, cluster groups and clusters.

use crate::core::domain::value_object::{ClusterGroupId, ClusterId, ClusterTypeId};
use serde::{Deserialize, Serialize};

/// A named category of cluster (e.g. "VMware vSphere", "Proxmox VE").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterType {
    pub id: ClusterTypeId,
    pub name: String,
    pub slug: String,
}

/// A named grouping of clusters (e.g. a region or an environment).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterGroup {
    pub id: ClusterGroupId,
    pub name: String,
    pub slug: String,
}

/// A cluster of physical devices hosting virtual machines.
///
/// Member devices and virtual machines are not stored here; they point back at
/// the cluster through their own `cluster` reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    /// The cluster type (required).
    #[serde(rename = "type")]
    pub cluster_type: ClusterTypeId,
    /// Optional cluster group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<ClusterGroupId>,
}
