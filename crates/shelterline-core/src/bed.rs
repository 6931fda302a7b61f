use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The fixed size of the bed inventory. Created once at startup and never
/// grown or shrunk; startup fails if the registry disagrees.
pub const TOTAL_BEDS: u16 = 108;

/// Identity of one physical bed, an integer in `1..=108`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BedId(u16);

impl BedId {
    /// Validate and wrap a raw bed number.
    pub fn new(id: i64) -> Result<Self> {
        if (1..=i64::from(TOTAL_BEDS)).contains(&id) {
            Ok(Self(id as u16))
        } else {
            Err(CoreError::InvalidBedId(id))
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Iterate the full inventory, `1..=108`, in id order.
    pub fn all() -> impl Iterator<Item = BedId> {
        (1..=TOTAL_BEDS).map(BedId)
    }
}

impl fmt::Display for BedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bed status, exactly three states.
///
/// Transitions are guarded by the registry's compare-and-set:
/// `available -> held` (allocation or manual hold), `held -> occupied`
/// (check-in), `held -> available` (cancel or expiry),
/// `occupied -> available` (check-out), `available -> occupied` (walk-in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedStatus {
    Available,
    Held,
    Occupied,
}

impl BedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Held => "held",
            BedStatus::Occupied => "occupied",
        }
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bed_id_range_is_enforced() {
        assert!(BedId::new(0).is_err());
        assert!(BedId::new(1).is_ok());
        assert!(BedId::new(108).is_ok());
        assert!(BedId::new(109).is_err());
        assert!(BedId::new(-3).is_err());
    }

    #[test]
    fn full_inventory_is_108_beds() {
        let ids: Vec<BedId> = BedId::all().collect();
        assert_eq!(ids.len(), usize::from(TOTAL_BEDS));
        assert_eq!(ids.first().map(|b| b.get()), Some(1));
        assert_eq!(ids.last().map(|b| b.get()), Some(108));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BedStatus::Available).unwrap(),
            "\"available\""
        );
        assert_eq!(serde_json::to_string(&BedStatus::Held).unwrap(), "\"held\"");
    }
}
