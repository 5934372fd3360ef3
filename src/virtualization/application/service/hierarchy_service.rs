//! Parent/child resolution and ordered bulk deletion of VM components.
//!
//! Interfaces of one virtual machine form a forest through their `parent`
//! ids. Deletion has to remove every child before its parent, so the
//! resolver ranks each selected interface by its depth in that forest and
//! emits the deepest first. Depth is computed by walking the parent chain
//! with a visited set; a repeated id means the stored links contain a cycle
//! and the whole batch is refused.

use crate::core::{
    config::InventoryConfig,
    domain::{
        error::{InventoryError, InventoryResult, ValidationError},
        model::{virtual_machine::VirtualDisk, vm_interface::VmInterface},
        value_object::{VirtualDiskId, VirtualMachineId, VmInterfaceId, natural_cmp},
    },
    infrastructure::EntityStore,
};
use crate::virtualization::application::service::{abort, batch_ids, ensure_resolved};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct HierarchyService {
    store: Arc<dyn EntityStore>,
    config: Arc<InventoryConfig>,
}

/// Why a parent chain could not be walked to its root.
enum ChainBreak {
    /// `child` names a parent that is not an interface of the same VM.
    Foreign {
        child: VmInterfaceId,
        parent: VmInterfaceId,
    },
    Cycle,
}

/// Every interface of one virtual machine, indexed by id.
struct InterfaceArena {
    vm: VirtualMachineId,
    interfaces: HashMap<VmInterfaceId, VmInterface>,
}

impl InterfaceArena {
    fn new(vm: VirtualMachineId, interfaces: Vec<VmInterface>) -> Self {
        Self {
            vm,
            interfaces: interfaces.into_iter().map(|i| (i.id, i)).collect(),
        }
    }

    /// Number of ancestors above `id` within this VM.
    fn depth(&self, id: VmInterfaceId) -> Result<usize, ChainBreak> {
        let mut visited = HashSet::from([id]);
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.interfaces.get(&current).and_then(|i| i.parent) {
            if !self.interfaces.contains_key(&parent) {
                return Err(ChainBreak::Foreign {
                    child: current,
                    parent,
                });
            }
            if !visited.insert(parent) {
                return Err(ChainBreak::Cycle);
            }
            depth += 1;
            current = parent;
        }
        Ok(depth)
    }
}

impl HierarchyService {
    pub fn new(store: Arc<dyn EntityStore>, config: Arc<InventoryConfig>) -> Self {
        Self { store, config }
    }

    /// Orders `interface_ids` so that every child precedes its parent.
    ///
    /// The result is grouped by owning virtual machine (ascending id).
    /// Within a group, deeper interfaces come first and ties are broken by
    /// natural name order, so the output does not depend on the order of
    /// the input.
    ///
    /// # Errors
    ///
    /// * `Validation` for an empty or oversized batch, or when an interface's
    ///   parent belongs to a different virtual machine
    /// * `NotFound` if any id does not resolve
    /// * `OrderingViolation` if the parent links contain a cycle
    #[instrument(skip(self, interface_ids), fields(requested = interface_ids.len()))]
    pub async fn order_for_deletion(
        &self,
        interface_ids: &[VmInterfaceId],
    ) -> InventoryResult<Vec<VmInterfaceId>> {
        let requested = batch_ids(interface_ids, &self.config)?;
        let ids: Vec<VmInterfaceId> = requested.iter().copied().collect();
        let selected = self.store.resolve_interfaces(&ids).await?;
        ensure_resolved(VmInterfaceId::KIND, &requested, selected.iter().map(|i| i.id))?;

        let mut by_vm: BTreeMap<VirtualMachineId, Vec<VmInterfaceId>> = BTreeMap::new();
        for iface in selected {
            by_vm.entry(iface.virtual_machine).or_default().push(iface.id);
        }

        let mut ordered = Vec::with_capacity(requested.len());
        for (vm, group) in by_vm {
            // Names, parents and depths all come from this one read; a
            // selected id missing from it was deleted or moved meanwhile.
            let arena = InterfaceArena::new(vm, self.store.interfaces_of(vm).await?);
            let mut ranked = Vec::with_capacity(group.len());
            for id in group {
                let iface = arena
                    .interfaces
                    .get(&id)
                    .ok_or_else(|| InventoryError::not_found(VmInterfaceId::KIND, id))?;
                let depth = self.depth_in(&arena, iface).await?;
                ranked.push((depth, iface));
            }
            ranked.sort_by(|(da, a), (db, b)| {
                db.cmp(da)
                    .then_with(|| natural_cmp(&a.name, &b.name))
                    .then(a.id.cmp(&b.id))
            });
            ordered.extend(ranked.into_iter().map(|(_, iface)| iface.id));
        }

        debug!(ordered = ?ordered, "deletion order resolved");
        Ok(ordered)
    }

    /// Immediate children of `interface_id`, in natural name order.
    #[instrument(skip(self))]
    pub async fn children_of(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<Vec<VmInterfaceId>> {
        let iface = self
            .store
            .interface(interface_id)
            .await?
            .ok_or_else(|| InventoryError::not_found(VmInterfaceId::KIND, interface_id))?;
        let siblings = self.store.interfaces_of(iface.virtual_machine).await?;

        if let Some(parent) = iface.parent {
            if !siblings.iter().any(|s| s.id == parent) {
                return Err(self
                    .foreign_parent(iface.id, iface.virtual_machine, parent)
                    .await);
            }
        }

        let mut children: Vec<&VmInterface> = siblings
            .iter()
            .filter(|s| s.parent == Some(interface_id) && s.id != interface_id)
            .collect();
        children.sort_by(|a, b| natural_cmp(&a.name, &b.name).then(a.id.cmp(&b.id)));
        Ok(children.into_iter().map(|c| c.id).collect())
    }

    /// Deletes `interface_ids` children-first inside one transaction.
    ///
    /// Returns the number of interfaces deleted. If any deletion fails (for
    /// instance because a parent still has a child outside the batch) the
    /// transaction is rolled back and nothing is deleted.
    #[instrument(skip(self, interface_ids), fields(requested = interface_ids.len()))]
    pub async fn delete_interfaces(
        &self,
        interface_ids: &[VmInterfaceId],
    ) -> InventoryResult<usize> {
        let order = self.order_for_deletion(interface_ids).await?;

        let txn = self.store.begin_transaction().await?;
        for id in &order {
            if let Err(err) = self.store.delete_interface(txn, *id).await {
                return Err(abort(self.store.as_ref(), txn, err).await);
            }
        }
        self.store.commit(txn).await?;

        info!(%txn, count = order.len(), "interfaces deleted");
        Ok(order.len())
    }

    /// Orders `disk_ids` by owning virtual machine, then natural name.
    #[instrument(skip(self, disk_ids), fields(requested = disk_ids.len()))]
    pub async fn order_disks_for_deletion(
        &self,
        disk_ids: &[VirtualDiskId],
    ) -> InventoryResult<Vec<VirtualDiskId>> {
        let requested = batch_ids(disk_ids, &self.config)?;
        let ids: Vec<VirtualDiskId> = requested.iter().copied().collect();
        let mut disks: Vec<VirtualDisk> = self.store.resolve_disks(&ids).await?;
        ensure_resolved(VirtualDiskId::KIND, &requested, disks.iter().map(|d| d.id))?;

        disks.sort_by(|a, b| {
            a.virtual_machine
                .cmp(&b.virtual_machine)
                .then_with(|| natural_cmp(&a.name, &b.name))
                .then(a.id.cmp(&b.id))
        });
        Ok(disks.into_iter().map(|d| d.id).collect())
    }

    /// Deletes `disk_ids` inside one transaction; all or nothing.
    #[instrument(skip(self, disk_ids), fields(requested = disk_ids.len()))]
    pub async fn delete_disks(&self, disk_ids: &[VirtualDiskId]) -> InventoryResult<usize> {
        let order = self.order_disks_for_deletion(disk_ids).await?;

        let txn = self.store.begin_transaction().await?;
        for id in &order {
            if let Err(err) = self.store.delete_disk(txn, *id).await {
                return Err(abort(self.store.as_ref(), txn, err).await);
            }
        }
        self.store.commit(txn).await?;

        info!(%txn, count = order.len(), "virtual disks deleted");
        Ok(order.len())
    }

    async fn depth_in(&self, arena: &InterfaceArena, iface: &VmInterface) -> InventoryResult<usize> {
        match arena.depth(iface.id) {
            Ok(depth) => Ok(depth),
            Err(ChainBreak::Foreign { child, parent }) => {
                Err(self.foreign_parent(child, arena.vm, parent).await)
            }
            Err(ChainBreak::Cycle) => Err(InventoryError::OrderingViolation(format!(
                "cycle in parent links of interface {} on virtual machine {}",
                iface.id, arena.vm
            ))),
        }
    }

    /// Explains why `parent` is missing from the interfaces of `vm`.
    async fn foreign_parent(
        &self,
        child: VmInterfaceId,
        vm: VirtualMachineId,
        parent: VmInterfaceId,
    ) -> InventoryError {
        match self.store.interface(parent).await {
            Ok(Some(other)) => ValidationError::ConstraintViolation(format!(
                "Interface {} on virtual machine {} has parent {} belonging to virtual machine {}",
                child, vm, parent, other.virtual_machine
            ))
            .into(),
            Ok(None) => InventoryError::not_found(VmInterfaceId::KIND, parent),
            Err(err) => err,
        }
    }
}
