use crate::core::{
    config::InventoryConfig,
    domain::{
        error::{InventoryError, InventoryResult, ValidationError},
        model::{device::Device, virtual_machine::VirtualMachine},
        value_object::{ClusterId, DeviceId, natural_cmp},
    },
    infrastructure::{EntityStore, TransactionId},
};
use crate::virtualization::application::service::{abort, batch_ids, ensure_resolved};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// Assigns physical devices to clusters and removes them again.
///
/// Both directions run as a single store transaction per call: either every
/// requested device ends up with the new cluster reference or none does.
pub struct MembershipService {
    store: Arc<dyn EntityStore>,
    config: Arc<InventoryConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Assign,
    Unassign,
}

impl MembershipService {
    pub fn new(store: Arc<dyn EntityStore>, config: Arc<InventoryConfig>) -> Self {
        Self { store, config }
    }

    /// Assigns every device in `device_ids` to `cluster_id`.
    ///
    /// Returns the number of distinct devices assigned. Devices already in
    /// the cluster are counted and left as they are.
    ///
    /// # Errors
    ///
    /// * `Validation` if `device_ids` is empty or larger than the batch limit
    /// * `NotFound` if the cluster or any device does not resolve; nothing is
    ///   changed in that case
    /// * `Storage` if a write or the commit fails, including when another
    ///   transaction changed one of the devices first; every staged
    ///   assignment is rolled back
    #[instrument(skip(self, device_ids), fields(cluster = %cluster_id, requested = device_ids.len()))]
    pub async fn add_devices(
        &self,
        cluster_id: ClusterId,
        device_ids: &[DeviceId],
    ) -> InventoryResult<usize> {
        self.apply(cluster_id, device_ids, Membership::Assign).await
    }

    /// Unassigns every device in `device_ids` from `cluster_id`.
    ///
    /// Devices are never deleted; their cluster reference is cleared.
    /// Devices that are already unassigned are counted as removed. A device
    /// that belongs to a different cluster is rejected with a validation
    /// error so that one cluster's form cannot detach another cluster's
    /// members.
    #[instrument(skip(self, device_ids), fields(cluster = %cluster_id, requested = device_ids.len()))]
    pub async fn remove_devices(
        &self,
        cluster_id: ClusterId,
        device_ids: &[DeviceId],
    ) -> InventoryResult<usize> {
        self.apply(cluster_id, device_ids, Membership::Unassign).await
    }

    async fn apply(
        &self,
        cluster_id: ClusterId,
        device_ids: &[DeviceId],
        membership: Membership,
    ) -> InventoryResult<usize> {
        let requested = batch_ids(device_ids, &self.config)?;
        self.require_cluster(cluster_id).await?;

        let txn = self.store.begin_transaction().await?;
        let count = match self.stage(txn, cluster_id, &requested, membership).await {
            Ok(count) => count,
            Err(err) => return Err(abort(self.store.as_ref(), txn, err).await),
        };
        self.store.commit(txn).await?;

        if self.config.log_member_ids {
            info!(%txn, count, members = ?requested, ?membership, "cluster membership updated");
        } else {
            info!(%txn, count, ?membership, "cluster membership updated");
        }
        Ok(count)
    }

    /// Checks and stages the membership change against what `txn` sees.
    async fn stage(
        &self,
        txn: TransactionId,
        cluster_id: ClusterId,
        requested: &BTreeSet<DeviceId>,
        membership: Membership,
    ) -> InventoryResult<usize> {
        let ids: Vec<DeviceId> = requested.iter().copied().collect();
        let devices = self.store.resolve_devices_in(txn, &ids).await?;
        ensure_resolved(DeviceId::KIND, requested, devices.iter().map(|d| d.id))?;

        if membership == Membership::Unassign {
            let foreign: Vec<String> = devices
                .iter()
                .filter(|d| d.cluster.is_some_and(|c| c != cluster_id))
                .map(|d| d.id.to_string())
                .collect();
            if !foreign.is_empty() {
                return Err(ValidationError::ConstraintViolation(format!(
                    "Device(s) {} are not members of cluster {}",
                    foreign.join(", "),
                    cluster_id
                ))
                .into());
            }
        }

        let target = match membership {
            Membership::Assign => Some(cluster_id),
            Membership::Unassign => None,
        };
        for device in &devices {
            let updated = Device {
                cluster: target,
                ..device.clone()
            };
            self.store.persist_device(txn, &updated).await?;
        }
        Ok(devices.len())
    }

    /// Devices assigned to `cluster_id`, in natural name order.
    #[instrument(skip(self))]
    pub async fn cluster_devices(&self, cluster_id: ClusterId) -> InventoryResult<Vec<Device>> {
        self.require_cluster(cluster_id).await?;
        let mut devices = self.store.devices_in_cluster(cluster_id).await?;
        devices.sort_by(|a, b| natural_cmp(&a.name, &b.name).then(a.id.cmp(&b.id)));
        Ok(devices)
    }

    /// Virtual machines assigned to `cluster_id`, in natural name order.
    #[instrument(skip(self))]
    pub async fn cluster_virtual_machines(
        &self,
        cluster_id: ClusterId,
    ) -> InventoryResult<Vec<VirtualMachine>> {
        self.require_cluster(cluster_id).await?;
        let mut vms = self.store.resolve_virtual_machines(cluster_id).await?;
        vms.sort_by(|a, b| natural_cmp(&a.name, &b.name).then(a.id.cmp(&b.id)));
        Ok(vms)
    }

    async fn require_cluster(&self, cluster_id: ClusterId) -> InventoryResult<()> {
        match self.store.cluster(cluster_id).await? {
            Some(_) => Ok(()),
            None => Err(InventoryError::not_found(ClusterId::KIND, cluster_id)),
        }
    }
}
