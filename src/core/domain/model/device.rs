use crate::core::domain::value_object::{ClusterId, DeviceId};
use serde::{Deserialize, Serialize};

/// A physical device that may be a member of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Cluster membership; `None` when unassigned.
    #[serde(default)]
    pub cluster: Option<ClusterId>,
}
