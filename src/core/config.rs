//! Runtime configuration for the inventory core.

use crate::core::domain::error::{InventoryResult, ValidationError};

/// Tunables applied by the membership and deletion services.
///
/// # Examples
///
/// ```
/// use virt_inventory::InventoryConfig;
///
/// let config = InventoryConfig {
///     max_batch_size: 250,
///     ..Default::default()
/// };
/// assert!(!config.log_member_ids);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Largest number of ids accepted by a single bulk operation.
    pub max_batch_size: usize,
    /// Include the full id list in bulk-operation log events.
    pub log_member_ids: bool,
}

impl InventoryConfig {
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

    const MAX_BATCH_SIZE_KEY: &'static str = "VIRT_INVENTORY_MAX_BATCH_SIZE";
    const LOG_MEMBER_IDS_KEY: &'static str = "VIRT_INVENTORY_LOG_MEMBER_IDS";

    /// Builds a configuration from the process environment.
    pub fn from_env() -> InventoryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from `VIRT_INVENTORY_*` keys resolved through
    /// `lookup`. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> InventoryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(Self::MAX_BATCH_SIZE_KEY) {
            let value = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ValidationError::Field {
                    field: Self::MAX_BATCH_SIZE_KEY.to_string(),
                    message: format!("Expected a positive integer, got '{}'", raw),
                })?;
            config.max_batch_size = value;
        }

        if let Some(raw) = lookup(Self::LOG_MEMBER_IDS_KEY) {
            config.log_member_ids = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ValidationError::Field {
                        field: Self::LOG_MEMBER_IDS_KEY.to_string(),
                        message: format!("Expected a boolean, got '{}'", raw),
                    }
                    .into());
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the services cannot work with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_batch_size == 0 {
            return Err(ValidationError::Field {
                field: "max_batch_size".to_string(),
                message: "Batch size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            log_member_ids: false,
        }
    }
}
