//! Typed record identifiers.
//!
//! Every entity kind gets its own identifier type so that a `DeviceId` can
//! never be handed to an operation expecting a `ClusterId`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! object_id {
    ($($(#[$meta:meta])* $name:ident => $kind:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(u64);

            impl $name {
                /// The entity kind this identifier refers to, used in error messages.
                pub const KIND: &'static str = $kind;

                /// Wraps a raw primary key.
                pub const fn new(raw: u64) -> Self {
                    Self(raw)
                }

                /// Returns the raw primary key.
                #[must_use]
                pub const fn get(&self) -> u64 {
                    self.0
                }
            }

            impl From<u64> for $name {
                fn from(raw: u64) -> Self {
                    Self(raw)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

object_id! {
    /// Identifier of a [`ClusterType`](crate::ClusterType).
    ClusterTypeId => "ClusterType";
    /// Identifier of a [`ClusterGroup`](crate::ClusterGroup).
    ClusterGroupId => "ClusterGroup";
    /// Identifier of a [`Cluster`](crate::Cluster).
    ClusterId => "Cluster";
    /// Identifier of a physical [`Device`](crate::Device).
    DeviceId => "Device";
    /// Identifier of a [`VirtualMachine`](crate::VirtualMachine).
    VirtualMachineId => "VirtualMachine";
    /// Identifier of a [`VmInterface`](crate::VmInterface).
    VmInterfaceId => "VMInterface";
    /// Identifier of a [`VirtualDisk`](crate::VirtualDisk).
    VirtualDiskId => "VirtualDisk";
    VlanId => "VLAN";
    VlanGroupId => "VLANGroup";
    VlanTranslationPolicyId => "VLANTranslationPolicy";
    IpAddressId => "IPAddress";
}
