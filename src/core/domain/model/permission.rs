//! Static map from (entity kind, action) to the capabilities a caller needs.
//!
//! The core does not evaluate permissions; it publishes which capabilities the
//! surrounding layer has to check before invoking an operation. The table is
//! an exhaustive `match`, so a new action cannot be added without deciding
//! its capabilities.

use serde::Serialize;
use std::fmt;

/// Entity kinds owned (or mutated) by the virtualization inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    ClusterType,
    ClusterGroup,
    Cluster,
    VirtualMachine,
    VmInterface,
    VirtualDisk,
    Device,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::ClusterType,
        EntityKind::ClusterGroup,
        EntityKind::Cluster,
        EntityKind::VirtualMachine,
        EntityKind::VmInterface,
        EntityKind::VirtualDisk,
        EntityKind::Device,
    ];

    const fn app_label(self) -> &'static str {
        match self {
            EntityKind::Device => "dcim",
            _ => "virtualization",
        }
    }

    const fn model_name(self) -> &'static str {
        match self {
            EntityKind::ClusterType => "clustertype",
            EntityKind::ClusterGroup => "clustergroup",
            EntityKind::Cluster => "cluster",
            EntityKind::VirtualMachine => "virtualmachine",
            EntityKind::VmInterface => "vminterface",
            EntityKind::VirtualDisk => "virtualdisk",
            EntityKind::Device => "device",
        }
    }
}

/// Operations a caller can request against an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectAction {
    List,
    View,
    Add,
    Edit,
    Delete,
    BulkImport,
    BulkEdit,
    BulkRename,
    BulkDelete,
    /// Assign devices to a cluster.
    AddDevices,
    /// Unassign devices from a cluster.
    RemoveDevices,
    /// Create interfaces or disks on many virtual machines at once.
    BulkAddComponents,
}

/// The four base capabilities every model carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PermissionAction {
    View,
    Add,
    Change,
    Delete,
}

impl PermissionAction {
    const fn as_str(self) -> &'static str {
        match self {
            PermissionAction::View => "view",
            PermissionAction::Add => "add",
            PermissionAction::Change => "change",
            PermissionAction::Delete => "delete",
        }
    }
}

/// A single capability, rendered as `<app_label>.<action>_<model>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Permission {
    pub kind: EntityKind,
    pub action: PermissionAction,
}

impl Permission {
    pub const fn new(kind: EntityKind, action: PermissionAction) -> Self {
        Self { kind, action }
    }

    /// Returns the fully qualified permission name.
    pub fn codename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}_{}",
            self.kind.app_label(),
            self.action.as_str(),
            self.kind.model_name()
        )
    }
}

/// Returns the capabilities required to perform `action` on `kind`, or `None`
/// when the action does not apply to that kind.
pub fn required_permissions(kind: EntityKind, action: ObjectAction) -> Option<Vec<Permission>> {
    use ObjectAction::*;

    let base = |action| vec![Permission::new(kind, action)];
    match (kind, action) {
        (_, List | View) => Some(base(PermissionAction::View)),
        (_, Add | BulkImport) => Some(base(PermissionAction::Add)),
        (_, Edit | BulkEdit) => Some(base(PermissionAction::Change)),
        (_, Delete | BulkDelete) => Some(base(PermissionAction::Delete)),
        (EntityKind::VmInterface | EntityKind::VirtualDisk, BulkRename) => {
            Some(base(PermissionAction::Change))
        }
        (EntityKind::Cluster, AddDevices | RemoveDevices) => Some(vec![
            Permission::new(EntityKind::Cluster, PermissionAction::Change),
            Permission::new(EntityKind::Device, PermissionAction::Change),
        ]),
        (EntityKind::VmInterface | EntityKind::VirtualDisk, BulkAddComponents) => {
            Some(base(PermissionAction::Add))
        }
        (_, BulkRename | AddDevices | RemoveDevices | BulkAddComponents) => None,
    }
}
