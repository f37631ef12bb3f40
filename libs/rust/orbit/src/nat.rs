use serde::{Deserialize, Serialize};
use std::fmt;

/// An unsigned integer as the gateway transmits it: either a JSON number or,
/// for values past the safe-integer range of JavaScript clients, a decimal
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireNat {
    Number(u64),
    Text(String),
}

impl Default for WireNat {
    fn default() -> Self {
        WireNat::Number(0)
    }
}

impl From<u64> for WireNat {
    fn from(value: u64) -> Self {
        WireNat::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid natural number: {0:?}")]
pub struct InvalidNat(pub String);

impl WireNat {
    /// Exact conversion; `Ok(None)` when the value does not fit in `u64`.
    pub fn to_u64(&self) -> Result<Option<u64>, InvalidNat> {
        match self {
            WireNat::Number(n) => Ok(Some(*n)),
            WireNat::Text(text) => {
                let digits = text.trim().replace('_', "");
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(InvalidNat(text.clone()));
                }
                Ok(digits.parse::<u64>().ok())
            }
        }
    }

    /// Converts to `u64`, clamping values that overflow to `u64::MAX`.
    pub fn to_u64_saturating(&self) -> Result<u64, InvalidNat> {
        match self.to_u64()? {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(value = %self, "Integer exceeds u64 range, saturating");
                Ok(u64::MAX)
            }
        }
    }
}

impl fmt::Display for WireNat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireNat::Number(n) => write!(f, "{n}"),
            WireNat::Text(text) => f.write_str(text),
        }
    }
}
