use serde::{Deserialize, Serialize};

use crate::bed::{BedId, BedStatus};
use crate::code::ConfirmationCode;

/// State transitions broadcast to dashboard subscribers.
///
/// The wire form is a tagged object, e.g.
/// `{"event":"bed.status_changed","bed_id":4,"from":"available","to":"held"}`.
/// Missed events are not replayed; subscribers reconcile with a snapshot
/// read on reconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ShelterEvent {
    #[serde(rename = "bed.status_changed")]
    BedStatusChanged {
        bed_id: BedId,
        from: BedStatus,
        to: BedStatus,
    },
    #[serde(rename = "reservation.created")]
    ReservationCreated {
        code: ConfirmationCode,
        bed_id: BedId,
    },
    #[serde(rename = "reservation.cancelled")]
    ReservationCancelled {
        code: ConfirmationCode,
        bed_id: BedId,
    },
    #[serde(rename = "reservation.expired")]
    ReservationExpired {
        code: ConfirmationCode,
        bed_id: BedId,
    },
    #[serde(rename = "reservation.checked_in")]
    ReservationCheckedIn {
        code: ConfirmationCode,
        bed_id: BedId,
    },
}

impl ShelterEvent {
    /// The dotted event name used on the wire and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ShelterEvent::BedStatusChanged { .. } => "bed.status_changed",
            ShelterEvent::ReservationCreated { .. } => "reservation.created",
            ShelterEvent::ReservationCancelled { .. } => "reservation.cancelled",
            ShelterEvent::ReservationExpired { .. } => "reservation.expired",
            ShelterEvent::ReservationCheckedIn { .. } => "reservation.checked_in",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_tagged_with_dotted_name() {
        let event = ShelterEvent::BedStatusChanged {
            bed_id: BedId::new(4).unwrap(),
            from: BedStatus::Available,
            to: BedStatus::Held,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "bed.status_changed");
        assert_eq!(json["bed_id"], 4);
        assert_eq!(json["from"], "available");
        assert_eq!(json["to"], "held");
    }
}
