//! The persistence seam the inventory core is written against.

use crate::core::domain::{
    error::InventoryResult,
    model::{
        cluster::{Cluster, ClusterGroup, ClusterType},
        device::Device,
        virtual_machine::{VirtualDisk, VirtualMachine},
        vlan::{Vlan, VlanGroup, VlanGroupScope, VlanTranslationPolicy},
        vm_interface::VmInterface,
    },
    value_object::{
        ClusterGroupId, ClusterId, ClusterTypeId, DeviceId, VirtualDiskId, VirtualMachineId,
        VlanGroupId, VlanId, VlanTranslationPolicyId, VmInterfaceId,
    },
};
use async_trait::async_trait;
use std::fmt;

/// Handle of an open store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// Relational store holding the inventory records.
///
/// Reads return only records the caller may see; permission filtering happens
/// before the core is invoked. Bulk resolvers (`resolve_*`) silently skip ids
/// that do not exist, so callers compare lengths to detect missing records.
///
/// Writes are always staged inside a transaction and become visible to readers
/// only after [`commit`](EntityStore::commit). A transaction that is rolled
/// back leaves no trace.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Opens a new transaction.
    async fn begin_transaction(&self) -> InventoryResult<TransactionId>;

    /// Atomically publishes every write staged in `txn`. A failed commit
    /// publishes nothing and closes the transaction.
    async fn commit(&self, txn: TransactionId) -> InventoryResult<()>;

    /// Discards every write staged in `txn`.
    async fn rollback(&self, txn: TransactionId) -> InventoryResult<()>;

    async fn cluster_type(&self, id: ClusterTypeId) -> InventoryResult<Option<ClusterType>>;

    async fn cluster_group(&self, id: ClusterGroupId) -> InventoryResult<Option<ClusterGroup>>;

    async fn cluster(&self, id: ClusterId) -> InventoryResult<Option<Cluster>>;

    /// Every cluster, ordered by id.
    async fn clusters(&self) -> InventoryResult<Vec<Cluster>>;

    async fn resolve_devices(&self, ids: &[DeviceId]) -> InventoryResult<Vec<Device>>;

    /// Like [`resolve_devices`](EntityStore::resolve_devices), but reads the
    /// state `txn` works on, including its own staged writes. A device
    /// update staged afterwards fails at commit if another transaction has
    /// changed that device in the meantime.
    async fn resolve_devices_in(
        &self,
        txn: TransactionId,
        ids: &[DeviceId],
    ) -> InventoryResult<Vec<Device>>;

    /// Devices whose cluster reference equals `cluster`.
    async fn devices_in_cluster(&self, cluster: ClusterId) -> InventoryResult<Vec<Device>>;

    async fn virtual_machine(
        &self,
        id: VirtualMachineId,
    ) -> InventoryResult<Option<VirtualMachine>>;

    /// Virtual machines whose cluster reference equals `cluster`.
    async fn resolve_virtual_machines(
        &self,
        cluster: ClusterId,
    ) -> InventoryResult<Vec<VirtualMachine>>;

    async fn interface(&self, id: VmInterfaceId) -> InventoryResult<Option<VmInterface>>;

    async fn resolve_interfaces(&self, ids: &[VmInterfaceId])
    -> InventoryResult<Vec<VmInterface>>;

    /// Every interface of a virtual machine, including parent linkage.
    async fn interfaces_of(&self, vm: VirtualMachineId) -> InventoryResult<Vec<VmInterface>>;

    async fn resolve_disks(&self, ids: &[VirtualDiskId]) -> InventoryResult<Vec<VirtualDisk>>;

    async fn disks_of(&self, vm: VirtualMachineId) -> InventoryResult<Vec<VirtualDisk>>;

    async fn resolve_vlans(&self, ids: &[VlanId]) -> InventoryResult<Vec<Vlan>>;

    async fn vlan_group(&self, id: VlanGroupId) -> InventoryResult<Option<VlanGroup>>;

    /// VLAN groups whose scope is exactly `scope`.
    async fn vlan_groups_scoped_to(&self, scope: VlanGroupScope)
    -> InventoryResult<Vec<VlanGroup>>;

    async fn translation_policy(
        &self,
        id: VlanTranslationPolicyId,
    ) -> InventoryResult<Option<VlanTranslationPolicy>>;

    /// Stages an update of a device record. The record `txn` currently sees
    /// must still be the committed one when `txn` commits.
    async fn persist_device(&self, txn: TransactionId, device: &Device) -> InventoryResult<()>;

    /// Stages the deletion of an interface. Fails while another interface
    /// still names it as parent.
    async fn delete_interface(&self, txn: TransactionId, id: VmInterfaceId)
    -> InventoryResult<()>;

    /// Stages the deletion of a virtual disk.
    async fn delete_disk(&self, txn: TransactionId, id: VirtualDiskId) -> InventoryResult<()>;
}
