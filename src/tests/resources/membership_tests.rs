use crate::{
    ClusterId, Device, DeviceId, ErrorKind, EntityStore, InventoryConfig, InventoryError,
    TransactionId, VirtualizationInventory,
    core::infrastructure::MockEntityStore,
    tests::fixtures::{
        CompetingWrite, Cue, InterleavingStore, inventory_fixture, inventory_over,
        inventory_with_config, store_from,
    },
};
use std::sync::Arc;

fn ids(raw: &[u64]) -> Vec<DeviceId> {
    raw.iter().copied().map(DeviceId::new).collect()
}

async fn cluster_of(store: &dyn EntityStore, id: u64) -> Option<ClusterId> {
    store
        .resolve_devices(&[DeviceId::new(id)])
        .await
        .unwrap()
        .first()
        .and_then(|device| device.cluster)
}

#[tokio::test]
async fn test_add_then_remove_scenario() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let x = ClusterId::new(3);

    let assigned = inventory.add_devices(x, &ids(&[1, 2, 3])).await.unwrap();
    assert_eq!(assigned, 3);
    for device in [1, 2, 3] {
        assert_eq!(cluster_of(store.as_ref(), device).await, Some(x));
    }

    let removed = inventory.remove_devices(x, &ids(&[2])).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(cluster_of(store.as_ref(), 1).await, Some(x));
    assert_eq!(cluster_of(store.as_ref(), 2).await, None);
    assert_eq!(cluster_of(store.as_ref(), 3).await, Some(x));
}

#[tokio::test]
async fn test_add_devices_is_idempotent() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let cluster = ClusterId::new(1);

    inventory.add_devices(cluster, &ids(&[1, 2])).await.unwrap();
    let once = store.snapshot().await;
    let count = inventory.add_devices(cluster, &ids(&[1, 2])).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(store.snapshot().await, once);
}

#[tokio::test]
async fn test_remove_restores_unassigned_state() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;
    let cluster = ClusterId::new(1);
    let affected = ids(&[1, 2, 3]);

    inventory.add_devices(cluster, &affected).await.unwrap();
    inventory.remove_devices(cluster, &affected).await.unwrap();

    for device in [1, 2, 3] {
        assert_eq!(cluster_of(store.as_ref(), device).await, None);
    }
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_remove_already_unassigned_is_noop() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let count = inventory
        .remove_devices(ClusterId::new(1), &ids(&[1, 2]))
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_unresolved_device_changes_nothing() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let err = inventory
        .add_devices(ClusterId::new(1), &ids(&[1, 2, 404]))
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::NotFound { kind: "Device", .. }));
    assert_eq!(err.to_string(), "Device not found: 404");
    assert_eq!(store.snapshot().await, before);
    assert_eq!(store.open_transactions().await, 0);
}

#[tokio::test]
async fn test_unknown_cluster_is_not_found() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    let err = inventory
        .add_devices(ClusterId::new(99), &ids(&[1]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = inventory.cluster_devices(ClusterId::new(99)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_empty_and_oversized_batches_are_rejected() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_with_config(
        &store,
        InventoryConfig {
            max_batch_size: 2,
            ..Default::default()
        },
    );

    let err = inventory.add_devices(ClusterId::new(1), &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = inventory
        .add_devices(ClusterId::new(1), &ids(&[1, 2, 3]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Duplicates collapse before the limit is applied.
    let count = inventory
        .add_devices(ClusterId::new(1), &ids(&[1, 1, 2, 2]))
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_remove_rejects_members_of_other_cluster() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);
    let before = store.snapshot().await;

    let err = inventory
        .remove_devices(ClusterId::new(1), &ids(&[1, 4]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_cluster_listings_use_natural_order() {
    let store = store_from(inventory_fixture());
    let inventory = inventory_over(&store);

    let devices = inventory.cluster_devices(ClusterId::new(2)).await.unwrap();
    let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["host-9", "host-10"]);

    let vms = inventory
        .cluster_virtual_machines(ClusterId::new(1))
        .await
        .unwrap();
    let names: Vec<&str> = vms.iter().map(|vm| vm.name.as_str()).collect();
    assert_eq!(names, vec!["vm-a", "vm-b", "vm-c"]);

    assert!(
        inventory
            .cluster_devices(ClusterId::new(3))
            .await
            .unwrap()
            .is_empty()
    );
}

fn device(id: u64, cluster: Option<u64>) -> Device {
    Device {
        id: DeviceId::new(id),
        name: format!("host-{}", id),
        cluster: cluster.map(ClusterId::new),
    }
}

fn mock_with_devices() -> MockEntityStore {
    let mut store = MockEntityStore::new();
    store.expect_cluster().returning(|id| {
        Ok(Some(crate::Cluster {
            id,
            name: "cluster-x".to_string(),
            cluster_type: crate::ClusterTypeId::new(1),
            group: None,
        }))
    });
    store
        .expect_begin_transaction()
        .times(1)
        .returning(|| Ok(TransactionId::new(1)));
    store
}

fn unassigned_devices(store: &mut MockEntityStore) {
    store
        .expect_resolve_devices_in()
        .withf(|txn, _| *txn == TransactionId::new(1))
        .returning(|_, ids| Ok(ids.iter().map(|id| device(id.get(), None)).collect()));
}

#[tokio::test]
async fn test_persist_failure_rolls_back_everything() {
    let mut store = mock_with_devices();
    unassigned_devices(&mut store);
    let mut persisted = 0;
    store.expect_persist_device().returning(move |_, _| {
        persisted += 1;
        if persisted == 2 {
            Err(InventoryError::Storage("connection reset".to_string()))
        } else {
            Ok(())
        }
    });
    store
        .expect_rollback()
        .withf(|txn| *txn == TransactionId::new(1))
        .times(1)
        .returning(|_| Ok(()));
    store.expect_commit().never();

    let inventory = VirtualizationInventory::builder().store(store).build().unwrap();
    let err = inventory
        .add_devices(ClusterId::new(1), &ids(&[1, 2, 3]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[tokio::test]
async fn test_commit_failure_is_storage_error() {
    let mut store = mock_with_devices();
    unassigned_devices(&mut store);
    store.expect_persist_device().times(2).returning(|_, _| Ok(()));
    store
        .expect_commit()
        .times(1)
        .returning(|_| Err(InventoryError::Storage("serialization failure".to_string())));
    store.expect_rollback().never();

    let inventory = VirtualizationInventory::builder()
        .shared_store(Arc::new(store))
        .build()
        .unwrap();
    let err = inventory
        .remove_devices(ClusterId::new(1), &ids(&[1, 2]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[tokio::test]
async fn test_membership_checks_run_inside_transaction() {
    let mut store = mock_with_devices();
    store
        .expect_resolve_devices_in()
        .returning(|_, ids| Ok(ids.iter().map(|id| device(id.get(), Some(2))).collect()));
    store.expect_resolve_devices().never();
    store.expect_persist_device().never();
    store.expect_commit().never();
    store
        .expect_rollback()
        .withf(|txn| *txn == TransactionId::new(1))
        .times(1)
        .returning(|_| Ok(()));

    let inventory = VirtualizationInventory::builder().store(store).build().unwrap();
    let err = inventory
        .remove_devices(ClusterId::new(1), &ids(&[7]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_remove_does_not_detach_device_moved_concurrently() {
    let store = store_from(inventory_fixture());
    inventory_over(&store)
        .add_devices(ClusterId::new(1), &ids(&[1]))
        .await
        .unwrap();

    let racing = InterleavingStore::new(
        store.clone(),
        Cue::BeginTransaction,
        CompetingWrite::PersistDevice(Device {
            id: DeviceId::new(1),
            name: "host-1".to_string(),
            cluster: Some(ClusterId::new(2)),
        }),
    );
    let inventory = VirtualizationInventory::builder().store(racing).build().unwrap();

    let err = inventory
        .remove_devices(ClusterId::new(1), &ids(&[1]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(cluster_of(store.as_ref(), 1).await, Some(ClusterId::new(2)));
    assert_eq!(store.open_transactions().await, 0);
}

#[tokio::test]
async fn test_add_reassigns_from_view_inside_transaction() {
    let store = store_from(inventory_fixture());
    let racing = InterleavingStore::new(
        store.clone(),
        Cue::BeginTransaction,
        CompetingWrite::PersistDevice(Device {
            id: DeviceId::new(2),
            name: "host-2-renamed".to_string(),
            cluster: None,
        }),
    );
    let inventory = VirtualizationInventory::builder().store(racing).build().unwrap();

    let count = inventory
        .add_devices(ClusterId::new(3), &ids(&[2]))
        .await
        .unwrap();
    assert_eq!(count, 1);

    // The concurrent rename survives; only the cluster reference changed.
    let devices = store.resolve_devices(&ids(&[2])).await.unwrap();
    assert_eq!(devices[0].name, "host-2-renamed");
    assert_eq!(devices[0].cluster, Some(ClusterId::new(3)));
}
