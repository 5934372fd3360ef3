use crate::{
    ClusterGroupId, ClusterId, ClusterMemberCounts, ClusterTypeId, ComponentCounts, ErrorKind,
    VirtualMachineId, VlanGroupScope,
    tests::fixtures::{inventory_fixture, inventory_over, store_from},
};

#[tokio::test]
async fn test_cluster_counts_per_type_and_group() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    assert_eq!(inventory.cluster_count_for_type(ClusterTypeId::new(1)).await.unwrap(), 2);
    assert_eq!(inventory.cluster_count_for_type(ClusterTypeId::new(2)).await.unwrap(), 1);
    assert_eq!(inventory.cluster_count_for_group(ClusterGroupId::new(1)).await.unwrap(), 1);

    let err = inventory
        .cluster_count_for_type(ClusterTypeId::new(9))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = inventory
        .cluster_count_for_group(ClusterGroupId::new(9))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_cluster_member_counts() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    assert_eq!(
        inventory.cluster_member_counts(ClusterId::new(2)).await.unwrap(),
        ClusterMemberCounts {
            device_count: 2,
            vm_count: 2
        }
    );
    assert_eq!(
        inventory.cluster_member_counts(ClusterId::new(3)).await.unwrap(),
        ClusterMemberCounts::default()
    );
}

#[tokio::test]
async fn test_component_counts() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    assert_eq!(
        inventory.component_counts(VirtualMachineId::new(100)).await.unwrap(),
        ComponentCounts {
            interface_count: 6,
            disk_count: 2
        }
    );

    let err = inventory
        .component_counts(VirtualMachineId::new(999))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_related_vlan_groups_by_scope() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    let groups = inventory
        .related_vlan_groups(VlanGroupScope::Cluster(ClusterId::new(1)))
        .await
        .unwrap();
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["x-vlans"]);

    let groups = inventory
        .related_vlan_groups(VlanGroupScope::ClusterGroup(ClusterGroupId::new(1)))
        .await
        .unwrap();
    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["emea-vlans"]);

    assert!(
        inventory
            .related_vlan_groups(VlanGroupScope::Cluster(ClusterId::new(3)))
            .await
            .unwrap()
            .is_empty()
    );

    let err = inventory
        .related_vlan_groups(VlanGroupScope::Cluster(ClusterId::new(77)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
