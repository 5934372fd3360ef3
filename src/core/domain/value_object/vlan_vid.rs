use crate::core::domain::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated 802.1Q VLAN identifier (1-4094).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanVid(u16);

impl VlanVid {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4094;

    /// Creates a new VLAN id without validation.
    #[allow(unused)]
    pub(crate) fn new_unchecked(vid: u16) -> Self {
        Self(vid)
    }

    /// Creates a validated VLAN id.
    pub fn new(vid: u16) -> Result<Self, ValidationError> {
        validate_vid(vid)?;
        Ok(Self(vid))
    }

    /// Returns the numeric VLAN id.
    #[must_use]
    pub fn get(&self) -> u16 {
        self.0
    }
}

/// Validates a VLAN id against the usable 802.1Q range.
fn validate_vid(vid: u16) -> Result<(), ValidationError> {
    if !(VlanVid::MIN..=VlanVid::MAX).contains(&vid) {
        return Err(ValidationError::Field {
            field: "vid".to_string(),
            message: format!(
                "VLAN id must be between {} and {} (got {})",
                VlanVid::MIN,
                VlanVid::MAX,
                vid
            ),
        });
    }
    Ok(())
}

impl TryFrom<u16> for VlanVid {
    type Error = ValidationError;

    fn try_from(vid: u16) -> Result<Self, Self::Error> {
        VlanVid::new(vid)
    }
}

impl From<VlanVid> for u16 {
    fn from(vid: VlanVid) -> Self {
        vid.0
    }
}

impl fmt::Display for VlanVid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
