use crate::{
    EntityStore, ErrorKind, InventoryError, TransactionId, VirtualDiskId, VirtualMachineId,
    VirtualizationInventory, VmInterfaceId,
    core::infrastructure::MockEntityStore,
    tests::fixtures::{
        CompetingWrite, Cue, InterleavingStore, inventory_fixture, inventory_over, store_from,
    },
};
use serde_json::json;

fn ifaces(raw: &[u64]) -> Vec<VmInterfaceId> {
    raw.iter().copied().map(VmInterfaceId::new).collect()
}

fn disks(raw: &[u64]) -> Vec<VirtualDiskId> {
    raw.iter().copied().map(VirtualDiskId::new).collect()
}

#[tokio::test]
async fn test_children_precede_parents_for_every_input_order() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let (a, b, c) = (1, 2, 3);

    let permutations = [
        [a, b, c],
        [a, c, b],
        [b, a, c],
        [b, c, a],
        [c, a, b],
        [c, b, a],
    ];
    for input in permutations {
        let order = inventory.order_for_deletion(&ifaces(&input)).await.unwrap();
        assert_eq!(order, ifaces(&[c, b, a]), "input order {:?}", input);
    }
}

#[tokio::test]
async fn test_order_groups_by_vm_and_uses_natural_names() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    // vm-a: eth1, eth2, eth10 are roots; eth0.10 sits one level down.
    // vm-b: eth0.5 under eth0.
    let order = inventory
        .order_for_deletion(&ifaces(&[21, 5, 20, 6, 2, 4]))
        .await
        .unwrap();
    assert_eq!(order, ifaces(&[2, 4, 6, 5, 21, 20]));
}

#[tokio::test]
async fn test_partial_tree_orders_included_members_only() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    let order = inventory.order_for_deletion(&ifaces(&[1, 2])).await.unwrap();
    assert_eq!(order, ifaces(&[2, 1]));
}

#[tokio::test]
async fn test_delete_with_omitted_child_fails_without_partial_delete() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let err = inventory.delete_interfaces(&ifaces(&[1, 2])).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(store.snapshot().await, before);
    assert_eq!(store.open_transactions().await, 0);
}

#[tokio::test]
async fn test_delete_interfaces_removes_whole_tree() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    let count = inventory.delete_interfaces(&ifaces(&[1, 3, 2])).await.unwrap();
    assert_eq!(count, 3);

    let remaining = store.interfaces_of(VirtualMachineId::new(100)).await.unwrap();
    let names: Vec<&str> = remaining.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["eth1", "eth10", "eth2"]);
}

#[tokio::test]
async fn test_unknown_interface_is_not_found() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let err = inventory.delete_interfaces(&ifaces(&[3, 999])).await.unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: "VMInterface", .. }));
    assert_eq!(store.snapshot().await, before);

    let err = inventory.order_for_deletion(&[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_parent_cycle_aborts_batch() {
    let mut fixture = inventory_fixture();
    fixture["interfaces"] = json!([
        { "id": 30, "virtual_machine": 103, "name": "ens3", "parent": 31 },
        { "id": 31, "virtual_machine": 103, "name": "ens4", "parent": 30 },
        { "id": 32, "virtual_machine": 103, "name": "ens5" }
    ]);
    let store = store_from(fixture);
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let err = inventory.order_for_deletion(&ifaces(&[30])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderingViolation);

    let err = inventory.delete_interfaces(&ifaces(&[32, 31])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderingViolation);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_self_parent_is_a_cycle() {
    let mut fixture = inventory_fixture();
    fixture["interfaces"] = json!([
        { "id": 30, "virtual_machine": 103, "name": "loop0", "parent": 30 }
    ]);
    let store = store_from(fixture);
    let inventory = inventory_over(&store);

    let err = inventory.order_for_deletion(&ifaces(&[30])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderingViolation);
}

#[tokio::test]
async fn test_parent_on_another_vm_is_rejected() {
    let mut fixture = inventory_fixture();
    fixture["interfaces"] = json!([
        { "id": 1, "virtual_machine": 100, "name": "eth0" },
        { "id": 40, "virtual_machine": 104, "name": "eth0.7", "parent": 1 },
        { "id": 41, "virtual_machine": 104, "name": "eth0.7.1", "parent": 40 }
    ]);
    let store = store_from(fixture);
    let inventory = inventory_over(&store);

    let err = inventory.order_for_deletion(&ifaces(&[41])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = inventory.children_of(VmInterfaceId::new(40)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_children_of_is_one_level() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    assert_eq!(
        inventory.children_of(VmInterfaceId::new(1)).await.unwrap(),
        ifaces(&[2])
    );
    assert_eq!(
        inventory.children_of(VmInterfaceId::new(2)).await.unwrap(),
        ifaces(&[3])
    );
    assert!(
        inventory
            .children_of(VmInterfaceId::new(3))
            .await
            .unwrap()
            .is_empty()
    );

    let err = inventory.children_of(VmInterfaceId::new(999)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_disks_order_by_vm_then_natural_name() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    let order = inventory
        .order_disks_for_deletion(&disks(&[3, 1, 2]))
        .await
        .unwrap();
    assert_eq!(order, disks(&[2, 1, 3]));
}

#[tokio::test]
async fn test_delete_disks_is_all_or_nothing() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let err = inventory.delete_disks(&disks(&[1, 77])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.snapshot().await, before);

    let count = inventory.delete_disks(&disks(&[1, 2])).await.unwrap();
    assert_eq!(count, 2);
    assert!(store.disks_of(VirtualMachineId::new(100)).await.unwrap().is_empty());
    assert_eq!(store.disks_of(VirtualMachineId::new(101)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_disk_delete_failure_rolls_back() {
    let mut store = MockEntityStore::new();
    store.expect_resolve_disks().returning(|ids| {
        Ok(ids
            .iter()
            .map(|id| crate::VirtualDisk {
                id: *id,
                virtual_machine: VirtualMachineId::new(100),
                name: format!("disk{}", id),
                size: 1024,
            })
            .collect())
    });
    store
        .expect_begin_transaction()
        .times(1)
        .returning(|| Ok(TransactionId::new(9)));
    store
        .expect_delete_disk()
        .returning(|_, id| {
            if id == VirtualDiskId::new(2) {
                Err(InventoryError::Storage("disk is locked".to_string()))
            } else {
                Ok(())
            }
        });
    store.expect_rollback().times(1).returning(|_| Ok(()));
    store.expect_commit().never();

    let inventory = VirtualizationInventory::builder().store(store).build().unwrap();
    let err = inventory.delete_disks(&disks(&[1, 2, 3])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[tokio::test]
async fn test_order_ranks_from_single_read_when_leaf_vanishes() {
    let store = store_from(inventory_fixture());
    let racing = InterleavingStore::new(
        store.clone(),
        Cue::InterfacesOf,
        CompetingWrite::DeleteInterface(VmInterfaceId::new(3)),
    );
    let inventory = VirtualizationInventory::builder().store(racing).build().unwrap();

    let err = inventory
        .order_for_deletion(&ifaces(&[1, 2, 3]))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NotFound { kind: "VMInterface", .. }));
    assert!(err.to_string().contains('3'));
}

#[tokio::test]
async fn test_order_unaffected_by_concurrent_unrelated_delete() {
    let store = store_from(inventory_fixture());
    let racing = InterleavingStore::new(
        store.clone(),
        Cue::InterfacesOf,
        CompetingWrite::DeleteInterface(VmInterfaceId::new(6)),
    );
    let inventory = VirtualizationInventory::builder().store(racing).build().unwrap();

    let order = inventory
        .order_for_deletion(&ifaces(&[1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(order, ifaces(&[3, 2, 1]));
}
