mod core;
mod virtualization;


pub use crate::core::{
    config::InventoryConfig,
    domain::{
        error::{ErrorKind, InventoryError, InventoryResult, ValidationError},
        model::{
            cluster::{Cluster, ClusterGroup, ClusterType},
            device::Device,
            permission::{
                EntityKind, ObjectAction, Permission, PermissionAction, required_permissions,
            },
            resource_totals::{ClusterMemberCounts, ComponentCounts, ResourceTotals},
            virtual_machine::{VirtualDisk, VirtualMachine},
            vlan::{Vlan, VlanGroup, VlanGroupScope, VlanTranslationPolicy, VlanTranslationRule},
            vm_interface::{InterfaceMode, InterfaceVlan, VmInterface},
        },
        value_object::{
            ClusterGroupId, ClusterId, ClusterTypeId, DeviceId, IpAddressId, Vcpus,
            VirtualDiskId, VirtualMachineId, VlanGroupId, VlanId, VlanTranslationPolicyId,
            VlanVid, VmInterfaceId, natural_cmp,
        },
    },
    infrastructure::{EntityStore, InMemoryEntityStore, StoreSnapshot, TransactionId},
};
use crate::virtualization::application::service::{
    aggregation_service::AggregationService, hierarchy_service::HierarchyService,
    membership_service::MembershipService, related_objects, vlan_service::VlanService,
};
use std::sync::Arc;

/// Entry point to the virtualization inventory core.
///
/// The inventory performs membership changes, ordered component deletion,
/// VLAN resolution and resource rollups against an [`EntityStore`]. Callers
/// are expected to have filtered ids down to records the user may act on.
///
/// # Examples
///
/// ```
/// use virt_inventory::{ClusterId, DeviceId, InMemoryEntityStore, InventoryResult, VirtualizationInventory};
///
/// #[tokio::main]
/// async fn main() -> InventoryResult<()> {
///     let store = InMemoryEntityStore::from_json(serde_json::json!({
///         "cluster_types": [{ "id": 1, "name": "Proxmox VE", "slug": "proxmox-ve" }],
///         "clusters": [{ "id": 1, "name": "edge-1", "type": 1 }],
///         "devices": [{ "id": 7, "name": "host-7" }]
///     }))?;
///
///     let inventory = VirtualizationInventory::builder().store(store).build()?;
///     let assigned = inventory.add_devices(ClusterId::new(1), &[DeviceId::new(7)]).await?;
///     assert_eq!(assigned, 1);
///     Ok(())
/// }
/// ```
pub struct VirtualizationInventory {
    store: Arc<dyn EntityStore>,
    config: Arc<InventoryConfig>,
    membership: MembershipService,
    hierarchy: HierarchyService,
    vlans: VlanService,
    aggregation: AggregationService,
}

/// Builder for VirtualizationInventory configuration
#[derive(Default)]
pub struct VirtualizationInventoryBuilder {
    store: Option<Arc<dyn EntityStore>>,
    config: Option<InventoryConfig>,
}

impl VirtualizationInventoryBuilder {
    /// Uses `store` as the backing entity store.
    pub fn store<S: EntityStore + 'static>(self, store: S) -> Self {
        self.shared_store(Arc::new(store))
    }

    /// Uses an already shared store, for callers that keep their own handle.
    pub fn shared_store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: InventoryConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> InventoryResult<VirtualizationInventory> {
        let store = self.store.ok_or_else(|| InventoryError::Validation {
            source: ValidationError::Field {
                field: "store".to_string(),
                message: "An entity store is required".to_string(),
            },
        })?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let config = Arc::new(config);

        Ok(VirtualizationInventory {
            membership: MembershipService::new(Arc::clone(&store), Arc::clone(&config)),
            hierarchy: HierarchyService::new(Arc::clone(&store), Arc::clone(&config)),
            vlans: VlanService::new(Arc::clone(&store)),
            aggregation: AggregationService::new(Arc::clone(&store)),
            store,
            config,
        })
    }
}

impl VirtualizationInventory {
    /// Creates a new builder for VirtualizationInventory configuration
    pub fn builder() -> VirtualizationInventoryBuilder {
        VirtualizationInventoryBuilder::default()
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Assigns devices to a cluster in one transaction and returns how many
    /// were assigned.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - `device_ids` is empty or exceeds the configured batch size
    /// - the cluster or any of the devices does not exist
    /// - the store fails to persist or commit (nothing is changed)
    pub async fn add_devices(
        &self,
        cluster_id: ClusterId,
        device_ids: &[DeviceId],
    ) -> InventoryResult<usize> {
        self.membership.add_devices(cluster_id, device_ids).await
    }

    /// Unassigns devices from a cluster in one transaction and returns how
    /// many were removed.
    pub async fn remove_devices(
        &self,
        cluster_id: ClusterId,
        device_ids: &[DeviceId],
    ) -> InventoryResult<usize> {
        self.membership.remove_devices(cluster_id, device_ids).await
    }

    pub async fn cluster_devices(&self, cluster_id: ClusterId) -> InventoryResult<Vec<Device>> {
        self.membership.cluster_devices(cluster_id).await
    }

    pub async fn cluster_virtual_machines(
        &self,
        cluster_id: ClusterId,
    ) -> InventoryResult<Vec<VirtualMachine>> {
        self.membership.cluster_virtual_machines(cluster_id).await
    }

    /// Returns `interface_ids` in an order that deletes children before
    /// their parents.
    pub async fn order_for_deletion(
        &self,
        interface_ids: &[VmInterfaceId],
    ) -> InventoryResult<Vec<VmInterfaceId>> {
        self.hierarchy.order_for_deletion(interface_ids).await
    }

    pub async fn children_of(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<Vec<VmInterfaceId>> {
        self.hierarchy.children_of(interface_id).await
    }

    pub async fn delete_interfaces(&self, interface_ids: &[VmInterfaceId]) -> InventoryResult<usize> {
        self.hierarchy.delete_interfaces(interface_ids).await
    }

    pub async fn order_disks_for_deletion(
        &self,
        disk_ids: &[VirtualDiskId],
    ) -> InventoryResult<Vec<VirtualDiskId>> {
        self.hierarchy.order_disks_for_deletion(disk_ids).await
    }

    pub async fn delete_disks(&self, disk_ids: &[VirtualDiskId]) -> InventoryResult<usize> {
        self.hierarchy.delete_disks(disk_ids).await
    }

    /// Untagged VLAN first, then tagged VLANs, each flagged accordingly.
    pub async fn effective_vlans(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<Vec<InterfaceVlan>> {
        self.vlans.effective_vlans(interface_id).await
    }

    pub async fn translation_rules(
        &self,
        interface_id: VmInterfaceId,
    ) -> InventoryResult<Vec<VlanTranslationRule>> {
        self.vlans.translation_rules(interface_id).await
    }

    pub async fn validate_vlan_assignment(&self, interface_id: VmInterfaceId) -> InventoryResult<()> {
        self.vlans.validate_vlan_assignment(interface_id).await
    }

    /// Sums vCPU, memory and disk across the cluster's virtual machines,
    /// skipping unset values.
    pub async fn resource_totals(&self, cluster_id: ClusterId) -> InventoryResult<ResourceTotals> {
        self.aggregation.resource_totals(cluster_id).await
    }

    pub async fn cluster_count_for_type(&self, id: ClusterTypeId) -> InventoryResult<usize> {
        related_objects::cluster_count_for_type(self.store.as_ref(), id).await
    }

    pub async fn cluster_count_for_group(&self, id: ClusterGroupId) -> InventoryResult<usize> {
        related_objects::cluster_count_for_group(self.store.as_ref(), id).await
    }

    pub async fn cluster_member_counts(
        &self,
        cluster_id: ClusterId,
    ) -> InventoryResult<ClusterMemberCounts> {
        related_objects::cluster_member_counts(self.store.as_ref(), cluster_id).await
    }

    pub async fn component_counts(&self, vm: VirtualMachineId) -> InventoryResult<ComponentCounts> {
        related_objects::component_counts(self.store.as_ref(), vm).await
    }

    pub async fn related_vlan_groups(&self, scope: VlanGroupScope) -> InventoryResult<Vec<VlanGroup>> {
        related_objects::related_vlan_groups(self.store.as_ref(), scope).await
    }
}
