//! Related-object counts and scoped listings shown beside a record.
//!
//! These are plain functions over an [`EntityStore`] so they can be used
//! with any store, including a test double.

use crate::core::{
    domain::{
        error::{InventoryError, InventoryResult},
        model::{
            resource_totals::{ClusterMemberCounts, ComponentCounts},
            vlan::{VlanGroup, VlanGroupScope},
        },
        value_object::{ClusterGroupId, ClusterId, ClusterTypeId, VirtualMachineId, natural_cmp},
    },
    infrastructure::EntityStore,
};

/// Number of clusters of the given type.
pub async fn cluster_count_for_type(
    store: &dyn EntityStore,
    cluster_type: ClusterTypeId,
) -> InventoryResult<usize> {
    if store.cluster_type(cluster_type).await?.is_none() {
        return Err(InventoryError::not_found(ClusterTypeId::KIND, cluster_type));
    }
    let clusters = store.clusters().await?;
    Ok(clusters
        .iter()
        .filter(|c| c.cluster_type == cluster_type)
        .count())
}

/// Number of clusters in the given group.
pub async fn cluster_count_for_group(
    store: &dyn EntityStore,
    group: ClusterGroupId,
) -> InventoryResult<usize> {
    if store.cluster_group(group).await?.is_none() {
        return Err(InventoryError::not_found(ClusterGroupId::KIND, group));
    }
    let clusters = store.clusters().await?;
    Ok(clusters.iter().filter(|c| c.group == Some(group)).count())
}

pub async fn cluster_member_counts(
    store: &dyn EntityStore,
    cluster: ClusterId,
) -> InventoryResult<ClusterMemberCounts> {
    if store.cluster(cluster).await?.is_none() {
        return Err(InventoryError::not_found(ClusterId::KIND, cluster));
    }
    Ok(ClusterMemberCounts {
        device_count: store.devices_in_cluster(cluster).await?.len(),
        vm_count: store.resolve_virtual_machines(cluster).await?.len(),
    })
}

pub async fn component_counts(
    store: &dyn EntityStore,
    vm: VirtualMachineId,
) -> InventoryResult<ComponentCounts> {
    if store.virtual_machine(vm).await?.is_none() {
        return Err(InventoryError::not_found(VirtualMachineId::KIND, vm));
    }
    Ok(ComponentCounts {
        interface_count: store.interfaces_of(vm).await?.len(),
        disk_count: store.disks_of(vm).await?.len(),
    })
}

/// VLAN groups scoped to a cluster or cluster group, in natural name order.
pub async fn related_vlan_groups(
    store: &dyn EntityStore,
    scope: VlanGroupScope,
) -> InventoryResult<Vec<VlanGroup>> {
    let exists = match scope {
        VlanGroupScope::Cluster(id) => store.cluster(id).await?.is_some(),
        VlanGroupScope::ClusterGroup(id) => store.cluster_group(id).await?.is_some(),
    };
    if !exists {
        return Err(match scope {
            VlanGroupScope::Cluster(id) => InventoryError::not_found(ClusterId::KIND, id),
            VlanGroupScope::ClusterGroup(id) => InventoryError::not_found(ClusterGroupId::KIND, id),
        });
    }

    let mut groups = store.vlan_groups_scoped_to(scope).await?;
    groups.sort_by(|a, b| natural_cmp(&a.name, &b.name).then(a.id.cmp(&b.id)));
    Ok(groups)
}
