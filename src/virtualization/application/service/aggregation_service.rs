use crate::core::{
    domain::{
        error::{InventoryError, InventoryResult},
        model::resource_totals::ResourceTotals,
        value_object::ClusterId,
    },
    infrastructure::EntityStore,
};
use std::ops::Add;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Computes resource rollups across the virtual machines of a cluster.
pub struct AggregationService {
    store: Arc<dyn EntityStore>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Sums vCPUs, memory and disk over the cluster's virtual machines.
    ///
    /// Each total skips VMs that leave the attribute unset and is `None`
    /// when no VM sets it, so an empty cluster yields all three absent.
    #[instrument(skip(self))]
    pub async fn resource_totals(&self, cluster_id: ClusterId) -> InventoryResult<ResourceTotals> {
        if self.store.cluster(cluster_id).await?.is_none() {
            return Err(InventoryError::not_found(ClusterId::KIND, cluster_id));
        }
        let vms = self.store.resolve_virtual_machines(cluster_id).await?;

        let totals = ResourceTotals {
            vcpus: sum_present(vms.iter().map(|vm| vm.vcpus)),
            memory: sum_present(vms.iter().map(|vm| vm.memory.map(u64::from))),
            disk: sum_present(vms.iter().map(|vm| vm.disk.map(u64::from))),
        };
        debug!(vm_count = vms.len(), ?totals, "resource totals computed");
        Ok(totals)
    }
}

/// Sums the present values, or `None` when every value is absent.
fn sum_present<T, I>(values: I) -> Option<T>
where
    T: Add<Output = T>,
    I: IntoIterator<Item = Option<T>>,
{
    values.into_iter().flatten().reduce(|acc, value| acc + value)
}
