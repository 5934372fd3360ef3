//! Domain models for virtual machine interfaces.

use crate::core::domain::model::vlan::Vlan;
use crate::core::domain::value_object::{
    IpAddressId, VirtualMachineId, VlanId, VlanTranslationPolicyId, VmInterfaceId,
};
use serde::{Deserialize, Serialize};

/// 802.1Q mode of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceMode {
    Access,
    Tagged,
    TaggedAll,
}

/// A virtual network interface attached to a virtual machine.
///
/// Interfaces form a tree through `parent`. The parent is stored as an
/// identifier, never as an owned reference, so a corrupt store can contain a
/// cycle; consumers walking the tree must detect it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VmInterface {
    pub id: VmInterfaceId,
    pub virtual_machine: VirtualMachineId,
    /// Unique within the owning VM.
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<VmInterfaceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<InterfaceMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untagged_vlan: Option<VlanId>,
    /// Tagged VLANs in relation order.
    #[serde(default)]
    pub tagged_vlans: Vec<VlanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_translation_policy: Option<VlanTranslationPolicyId>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddressId>,
}

fn default_enabled() -> bool {
    true
}

/// One entry of an interface's effective VLAN list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceVlan {
    pub vlan: Vlan,
    /// `false` for the untagged (native) VLAN, `true` for tagged members.
    pub tagged: bool,
}
