pub mod aggregation_service;
pub mod hierarchy_service;
pub mod membership_service;
pub mod related_objects;
pub mod vlan_service;

use crate::core::{
    config::InventoryConfig,
    domain::error::{InventoryError, InventoryResult, ValidationError},
    infrastructure::{EntityStore, TransactionId},
};
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::warn;

/// Deduplicates a bulk id list and checks it against the configured limits.
pub(crate) fn batch_ids<K: Ord + Copy>(
    ids: &[K],
    config: &InventoryConfig,
) -> Result<BTreeSet<K>, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::Field {
            field: "ids".to_string(),
            message: "At least one id is required".to_string(),
        });
    }
    let unique: BTreeSet<K> = ids.iter().copied().collect();
    if unique.len() > config.max_batch_size {
        return Err(ValidationError::Field {
            field: "ids".to_string(),
            message: format!(
                "Batch of {} ids exceeds the limit of {}",
                unique.len(),
                config.max_batch_size
            ),
        });
    }
    Ok(unique)
}

/// Fails with `NotFound` naming every requested id absent from `found`.
pub(crate) fn ensure_resolved<K>(
    kind: &'static str,
    requested: &BTreeSet<K>,
    found: impl IntoIterator<Item = K>,
) -> InventoryResult<()>
where
    K: Ord + Copy + Display,
{
    let found: BTreeSet<K> = found.into_iter().collect();
    let missing: Vec<K> = requested.difference(&found).copied().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(InventoryError::not_found_many(kind, missing))
    }
}

/// Rolls `txn` back and hands back the error that caused the abort.
pub(crate) async fn abort(
    store: &dyn EntityStore,
    txn: TransactionId,
    cause: InventoryError,
) -> InventoryError {
    warn!(%txn, error = %cause, "rolling back transaction");
    if let Err(rollback_err) = store.rollback(txn).await {
        warn!(%txn, error = %rollback_err, "rollback failed");
    }
    cause
}
