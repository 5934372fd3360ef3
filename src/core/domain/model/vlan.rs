//! Domain models for VLANs, VLAN groups and VLAN translation.

use crate::core::domain::value_object::{
    ClusterGroupId, ClusterId, VlanGroupId, VlanId, VlanTranslationPolicyId, VlanVid,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Vlan {
    pub id: VlanId,
    pub vid: VlanVid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<VlanGroupId>,
}

/// The object a VLAN group is scoped to.
///
/// Only the scope kinds the virtualization inventory owns are modelled; a
/// group without a scope is global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "scope_type", content = "scope_id", rename_all = "snake_case")]
pub enum VlanGroupScope {
    ClusterGroup(ClusterGroupId),
    Cluster(ClusterId),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VlanGroup {
    pub id: VlanGroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<VlanGroupScope>,
}

/// A single VLAN id rewrite between the local and the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VlanTranslationRule {
    pub local_vid: VlanVid,
    pub remote_vid: VlanVid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A named set of VLAN translation rules that interfaces may reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VlanTranslationPolicy {
    pub id: VlanTranslationPolicyId,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<VlanTranslationRule>,
}
