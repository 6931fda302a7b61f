use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A short, phone-friendly confirmation code, e.g. `SL-4821`.
///
/// This is the caller's sole handle for follow-up: it is read back over the
/// phone and given to front-desk staff at check-in. Collisions are possible
/// in the four-digit space; the allocation engine regenerates on a duplicate
/// insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationCode(String);

const PREFIX: &str = "SL-";

impl ConfirmationCode {
    /// Generate a fresh random code.
    pub fn generate() -> Self {
        let n: u16 = rand::thread_rng().gen_range(1000..10000);
        Self(format!("{PREFIX}{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ConfirmationCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| CoreError::invalid_code(s))?;
        if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::invalid_code(s))
        }
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
