//! In-memory reference implementation of [`EntityStore`].
//!
//! Committed records live behind a single `RwLock`. Each open transaction
//! owns a private working copy taken when it began plus a journal of the
//! writes it staged. Commit replays the journal onto the latest committed
//! state, re-checking every constraint, and swaps the result in; a failed
//! replay leaves the committed state untouched. A device update remembers
//! the record it was based on and is refused at commit if another
//! transaction changed that record first.

use crate::core::domain::{
    error::{InventoryError, InventoryResult},
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
use crate::core::infrastructure::entity_store::{EntityStore, TransactionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Serializable image of every record held by the store.
///
/// Used to seed the store and to persist it between runs; all collections
/// default to empty so partial fixtures are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub cluster_types: Vec<ClusterType>,
    #[serde(default)]
    pub cluster_groups: Vec<ClusterGroup>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub virtual_machines: Vec<VirtualMachine>,
    #[serde(default)]
    pub interfaces: Vec<VmInterface>,
    #[serde(default)]
    pub disks: Vec<VirtualDisk>,
    #[serde(default)]
    pub vlans: Vec<Vlan>,
    #[serde(default)]
    pub vlan_groups: Vec<VlanGroup>,
    #[serde(default)]
    pub translation_policies: Vec<VlanTranslationPolicy>,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    cluster_types: BTreeMap<ClusterTypeId, ClusterType>,
    cluster_groups: BTreeMap<ClusterGroupId, ClusterGroup>,
    clusters: BTreeMap<ClusterId, Cluster>,
    devices: BTreeMap<DeviceId, Device>,
    virtual_machines: BTreeMap<VirtualMachineId, VirtualMachine>,
    interfaces: BTreeMap<VmInterfaceId, VmInterface>,
    disks: BTreeMap<VirtualDiskId, VirtualDisk>,
    vlans: BTreeMap<VlanId, Vlan>,
    vlan_groups: BTreeMap<VlanGroupId, VlanGroup>,
    translation_policies: BTreeMap<VlanTranslationPolicyId, VlanTranslationPolicy>,
}

fn index<K: Ord, V>(items: Vec<V>, key: impl Fn(&V) -> K) -> BTreeMap<K, V> {
    items.into_iter().map(|item| (key(&item), item)).collect()
}

fn pick<K: Ord + Copy, V: Clone>(map: &BTreeMap<K, V>, ids: &[K]) -> Vec<V> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|id| map.get(&id).cloned())
        .collect()
}

impl StoreState {
    fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            cluster_types: index(snapshot.cluster_types, |t| t.id),
            cluster_groups: index(snapshot.cluster_groups, |g| g.id),
            clusters: index(snapshot.clusters, |c| c.id),
            devices: index(snapshot.devices, |d| d.id),
            virtual_machines: index(snapshot.virtual_machines, |vm| vm.id),
            interfaces: index(snapshot.interfaces, |i| i.id),
            disks: index(snapshot.disks, |d| d.id),
            vlans: index(snapshot.vlans, |v| v.id),
            vlan_groups: index(snapshot.vlan_groups, |g| g.id),
            translation_policies: index(snapshot.translation_policies, |p| p.id),
        }
    }

    fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            cluster_types: self.cluster_types.values().cloned().collect(),
            cluster_groups: self.cluster_groups.values().cloned().collect(),
            clusters: self.clusters.values().cloned().collect(),
            devices: self.devices.values().cloned().collect(),
            virtual_machines: self.virtual_machines.values().cloned().collect(),
            interfaces: self.interfaces.values().cloned().collect(),
            disks: self.disks.values().cloned().collect(),
            vlans: self.vlans.values().cloned().collect(),
            vlan_groups: self.vlan_groups.values().cloned().collect(),
            translation_policies: self.translation_policies.values().cloned().collect(),
        }
    }

    /// Applies one write, enforcing the same constraints a relational
    /// schema would (existence, foreign keys, RESTRICT on parent links).
    fn apply(&mut self, write: &StagedWrite) -> InventoryResult<()> {
        match write {
            StagedWrite::Device { base, device } => {
                match self.devices.get(&device.id) {
                    None => return Err(InventoryError::not_found(DeviceId::KIND, device.id)),
                    Some(current) if current != base => {
                        return Err(InventoryError::Storage(format!(
                            "device {} was modified by a concurrent transaction",
                            device.id
                        )));
                    }
                    Some(_) => {}
                }
                if let Some(cluster) = device.cluster {
                    if !self.clusters.contains_key(&cluster) {
                        return Err(InventoryError::Storage(format!(
                            "foreign key violation: device {} references missing cluster {}",
                            device.id, cluster
                        )));
                    }
                }
                self.devices.insert(device.id, device.clone());
            }
            StagedWrite::DeleteInterface(id) => {
                if !self.interfaces.contains_key(id) {
                    return Err(InventoryError::not_found(VmInterfaceId::KIND, id));
                }
                let children: Vec<String> = self
                    .interfaces
                    .values()
                    .filter(|iface| iface.parent == Some(*id) && iface.id != *id)
                    .map(|iface| iface.id.to_string())
                    .collect();
                if !children.is_empty() {
                    return Err(InventoryError::Storage(format!(
                        "foreign key violation: interface {} is still the parent of interface(s) {}",
                        id,
                        children.join(", ")
                    )));
                }
                self.interfaces.remove(id);
            }
            StagedWrite::DeleteDisk(id) => {
                if self.disks.remove(id).is_none() {
                    return Err(InventoryError::not_found(VirtualDiskId::KIND, id));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    /// `base` is the record the writing transaction saw.
    Device { base: Device, device: Device },
    DeleteInterface(VmInterfaceId),
    DeleteDisk(VirtualDiskId),
}

#[derive(Debug)]
struct StagedTransaction {
    working: StoreState,
    journal: Vec<StagedWrite>,
}

/// An [`EntityStore`] holding every record in memory.
///
/// # Examples
///
/// ```
/// use virt_inventory::{InMemoryEntityStore, StoreSnapshot};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = InMemoryEntityStore::from_snapshot(StoreSnapshot::default());
/// assert!(store.snapshot().await.clusters.is_empty());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    committed: RwLock<StoreState>,
    pending: Mutex<HashMap<TransactionId, StagedTransaction>>,
    next_txn: AtomicU64,
}

impl InMemoryEntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `snapshot`.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            committed: RwLock::new(StoreState::from_snapshot(snapshot)),
            ..Self::default()
        }
    }

    /// Creates a store seeded from a JSON document shaped like [`StoreSnapshot`].
    pub fn from_json(value: serde_json::Value) -> InventoryResult<Self> {
        let snapshot: StoreSnapshot = serde_json::from_value(value)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Loads a store from a JSON snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> InventoryResult<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)?;
        debug!(path = %path.as_ref().display(), "loaded inventory snapshot");
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the committed state to a JSON snapshot file.
    pub async fn save(&self, path: impl AsRef<Path>) -> InventoryResult<()> {
        let snapshot = self.snapshot().await;
        let raw = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(path.as_ref(), raw).await?;
        debug!(path = %path.as_ref().display(), "saved inventory snapshot");
        Ok(())
    }

    /// Returns a copy of the committed state.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.committed.read().await.to_snapshot()
    }

    /// Number of transactions that are open (neither committed nor rolled back).
    pub async fn open_transactions(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn stage(
        &self,
        txn: TransactionId,
        build: impl FnOnce(&StoreState) -> InventoryResult<StagedWrite> + Send,
    ) -> InventoryResult<()> {
        let mut pending = self.pending.lock().await;
        let staged = pending
            .get_mut(&txn)
            .ok_or_else(|| InventoryError::Storage(format!("unknown transaction {}", txn)))?;
        let write = build(&staged.working)?;
        staged.working.apply(&write)?;
        staged.journal.push(write);
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn begin_transaction(&self) -> InventoryResult<TransactionId> {
        let txn = TransactionId::new(self.next_txn.fetch_add(1, Ordering::Relaxed) + 1);
        let working = self.committed.read().await.clone();
        self.pending.lock().await.insert(
            txn,
            StagedTransaction {
                working,
                journal: Vec::new(),
            },
        );
        debug!(%txn, "transaction opened");
        Ok(txn)
    }

    async fn commit(&self, txn: TransactionId) -> InventoryResult<()> {
        let staged = self
            .pending
            .lock()
            .await
            .remove(&txn)
            .ok_or_else(|| InventoryError::Storage(format!("unknown transaction {}", txn)))?;

        let mut committed = self.committed.write().await;
        let mut next = committed.clone();
        for write in &staged.journal {
            if let Err(err) = next.apply(write) {
                warn!(%txn, error = %err, "commit failed, transaction discarded");
                return Err(InventoryError::Storage(format!(
                    "commit of {} failed: {}",
                    txn, err
                )));
            }
        }
        *committed = next;
        debug!(%txn, writes = staged.journal.len(), "transaction committed");
        Ok(())
    }

    async fn rollback(&self, txn: TransactionId) -> InventoryResult<()> {
        match self.pending.lock().await.remove(&txn) {
            Some(staged) => {
                debug!(%txn, discarded = staged.journal.len(), "transaction rolled back");
                Ok(())
            }
            None => Err(InventoryError::Storage(format!(
                "unknown transaction {}",
                txn
            ))),
        }
    }

    async fn cluster_type(&self, id: ClusterTypeId) -> InventoryResult<Option<ClusterType>> {
        Ok(self.committed.read().await.cluster_types.get(&id).cloned())
    }

    async fn cluster_group(&self, id: ClusterGroupId) -> InventoryResult<Option<ClusterGroup>> {
        Ok(self.committed.read().await.cluster_groups.get(&id).cloned())
    }

    async fn cluster(&self, id: ClusterId) -> InventoryResult<Option<Cluster>> {
        Ok(self.committed.read().await.clusters.get(&id).cloned())
    }

    async fn clusters(&self) -> InventoryResult<Vec<Cluster>> {
        Ok(self.committed.read().await.clusters.values().cloned().collect())
    }

    async fn resolve_devices(&self, ids: &[DeviceId]) -> InventoryResult<Vec<Device>> {
        Ok(pick(&self.committed.read().await.devices, ids))
    }

    async fn resolve_devices_in(
        &self,
        txn: TransactionId,
        ids: &[DeviceId],
    ) -> InventoryResult<Vec<Device>> {
        let pending = self.pending.lock().await;
        let staged = pending
            .get(&txn)
            .ok_or_else(|| InventoryError::Storage(format!("unknown transaction {}", txn)))?;
        Ok(pick(&staged.working.devices, ids))
    }

    async fn devices_in_cluster(&self, cluster: ClusterId) -> InventoryResult<Vec<Device>> {
        let state = self.committed.read().await;
        Ok(state
            .devices
            .values()
            .filter(|device| device.cluster == Some(cluster))
            .cloned()
            .collect())
    }

    async fn virtual_machine(
        &self,
        id: VirtualMachineId,
    ) -> InventoryResult<Option<VirtualMachine>> {
        Ok(self.committed.read().await.virtual_machines.get(&id).cloned())
    }

    async fn resolve_virtual_machines(
        &self,
        cluster: ClusterId,
    ) -> InventoryResult<Vec<VirtualMachine>> {
        let state = self.committed.read().await;
        Ok(state
            .virtual_machines
            .values()
            .filter(|vm| vm.cluster == Some(cluster))
            .cloned()
            .collect())
    }

    async fn interface(&self, id: VmInterfaceId) -> InventoryResult<Option<VmInterface>> {
        Ok(self.committed.read().await.interfaces.get(&id).cloned())
    }

    async fn resolve_interfaces(
        &self,
        ids: &[VmInterfaceId],
    ) -> InventoryResult<Vec<VmInterface>> {
        Ok(pick(&self.committed.read().await.interfaces, ids))
    }

    async fn interfaces_of(&self, vm: VirtualMachineId) -> InventoryResult<Vec<VmInterface>> {
        let state = self.committed.read().await;
        Ok(state
            .interfaces
            .values()
            .filter(|iface| iface.virtual_machine == vm)
            .cloned()
            .collect())
    }

    async fn resolve_disks(&self, ids: &[VirtualDiskId]) -> InventoryResult<Vec<VirtualDisk>> {
        Ok(pick(&self.committed.read().await.disks, ids))
    }

    async fn disks_of(&self, vm: VirtualMachineId) -> InventoryResult<Vec<VirtualDisk>> {
        let state = self.committed.read().await;
        Ok(state
            .disks
            .values()
            .filter(|disk| disk.virtual_machine == vm)
            .cloned()
            .collect())
    }

    async fn resolve_vlans(&self, ids: &[VlanId]) -> InventoryResult<Vec<Vlan>> {
        Ok(pick(&self.committed.read().await.vlans, ids))
    }

    async fn vlan_group(&self, id: VlanGroupId) -> InventoryResult<Option<VlanGroup>> {
        Ok(self.committed.read().await.vlan_groups.get(&id).cloned())
    }

    async fn vlan_groups_scoped_to(
        &self,
        scope: VlanGroupScope,
    ) -> InventoryResult<Vec<VlanGroup>> {
        let state = self.committed.read().await;
        Ok(state
            .vlan_groups
            .values()
            .filter(|group| group.scope == Some(scope))
            .cloned()
            .collect())
    }

    async fn translation_policy(
        &self,
        id: VlanTranslationPolicyId,
    ) -> InventoryResult<Option<VlanTranslationPolicy>> {
        Ok(self
            .committed
            .read()
            .await
            .translation_policies
            .get(&id)
            .cloned())
    }

    async fn persist_device(&self, txn: TransactionId, device: &Device) -> InventoryResult<()> {
        self.stage(txn, |working| {
            let base = working
                .devices
                .get(&device.id)
                .cloned()
                .ok_or_else(|| InventoryError::not_found(DeviceId::KIND, device.id))?;
            Ok(StagedWrite::Device {
                base,
                device: device.clone(),
            })
        })
        .await
    }

    async fn delete_interface(
        &self,
        txn: TransactionId,
        id: VmInterfaceId,
    ) -> InventoryResult<()> {
        self.stage(txn, |_| Ok(StagedWrite::DeleteInterface(id))).await
    }

    async fn delete_disk(&self, txn: TransactionId, id: VirtualDiskId) -> InventoryResult<()> {
        self.stage(txn, |_| Ok(StagedWrite::DeleteDisk(id))).await
    }
}
