use crate::core::domain::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// A virtual CPU allocation with two fractional digits (e.g. `0.25`, `4`, `12.5`).
///
/// Stored as hundredths so that rollups across many virtual machines are exact.
/// A single allocation ranges from `0.01` to `9999.99`; sums may exceed that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "VcpusRepr", into = "String")]
pub struct Vcpus(u64);

impl Vcpus {
    /// Largest single allocation, in hundredths.
    pub const MAX_HUNDREDTHS: u64 = 999_999;

    /// Creates a new allocation from hundredths without validation.
    #[allow(unused)]
    pub(crate) fn new_unchecked(hundredths: u64) -> Self {
        Self(hundredths)
    }

    /// Creates a validated allocation from hundredths of a vCPU.
    pub fn from_hundredths(hundredths: u64) -> Result<Self, ValidationError> {
        validate_vcpus(hundredths)?;
        Ok(Self(hundredths))
    }

    /// Creates a validated allocation of whole vCPUs.
    pub fn whole(count: u32) -> Result<Self, ValidationError> {
        Self::from_hundredths(u64::from(count) * 100)
    }

    /// Returns the allocation in hundredths of a vCPU.
    #[must_use]
    pub fn hundredths(&self) -> u64 {
        self.0
    }
}

/// Validates a single vCPU allocation expressed in hundredths.
fn validate_vcpus(hundredths: u64) -> Result<(), ValidationError> {
    if hundredths == 0 {
        return Err(ValidationError::Field {
            field: "vcpus".to_string(),
            message: "vCPU allocation must be at least 0.01".to_string(),
        });
    }
    if hundredths > Vcpus::MAX_HUNDREDTHS {
        return Err(ValidationError::ConstraintViolation(format!(
            "vCPU allocation cannot exceed 9999.99 (got {})",
            Vcpus(hundredths)
        )));
    }
    Ok(())
}

impl Add for Vcpus {
    type Output = Vcpus;

    fn add(self, rhs: Vcpus) -> Vcpus {
        Vcpus(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Vcpus {
    fn sum<I: Iterator<Item = Vcpus>>(iter: I) -> Self {
        iter.fold(Vcpus(0), Add::add)
    }
}

impl fmt::Display for Vcpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Vcpus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };

        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
            return Err(ValidationError::Format(format!(
                "Invalid vCPU value '{}': expected a decimal number",
                s
            )));
        }
        if fraction.len() > 2 {
            return Err(ValidationError::Format(format!(
                "Invalid vCPU value '{}': at most two decimal places are allowed",
                s
            )));
        }
        if whole.len() > 4 {
            return Err(ValidationError::ConstraintViolation(format!(
                "vCPU allocation cannot exceed 9999.99 (got {})",
                s
            )));
        }

        let whole: u64 = whole
            .parse()
            .map_err(|_| ValidationError::Format(format!("Invalid vCPU value '{}'", s)))?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            _ => fraction.parse::<u64>().unwrap_or(0),
        };

        Vcpus::from_hundredths(whole * 100 + fraction)
    }
}

/// Accepts both `"4.50"` and `4.5` on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum VcpusRepr {
    Text(String),
    Number(f64),
}

impl TryFrom<VcpusRepr> for Vcpus {
    type Error = ValidationError;

    fn try_from(repr: VcpusRepr) -> Result<Self, Self::Error> {
        match repr {
            VcpusRepr::Text(text) => text.parse(),
            VcpusRepr::Number(number) => {
                if !number.is_finite() || number < 0.0 {
                    return Err(ValidationError::Format(format!(
                        "Invalid vCPU value {}",
                        number
                    )));
                }
                let scaled = number * 100.0;
                // Tolerates binary noise such as 4.1 * 100 = 409.99999999999994.
                if (scaled - scaled.round()).abs() > 1e-6 {
                    return Err(ValidationError::Format(format!(
                        "Invalid vCPU value {}: at most two decimal places are allowed",
                        number
                    )));
                }
                Vcpus::from_hundredths(scaled.round() as u64)
            }
        }
    }
}

impl From<Vcpus> for String {
    fn from(vcpus: Vcpus) -> Self {
        vcpus.to_string()
    }
}
