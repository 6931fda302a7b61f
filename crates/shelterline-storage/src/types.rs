use serde::{Deserialize, Serialize};
use time::Date;

use shelterline_core::{BedId, BedStatus};

/// One row of a registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedRow {
    pub bed_id: BedId,
    pub status: BedStatus,
}

/// Insert payload for a chapel booking; the store assigns id, status and
/// creation timestamp.
#[derive(Debug, Clone)]
pub struct NewChapelBooking {
    pub date: Date,
    pub time: String,
    pub group_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: Option<String>,
    pub notes: Option<String>,
}

/// Insert payload for a volunteer registration.
#[derive(Debug, Clone)]
pub struct NewVolunteer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub availability: Vec<String>,
    pub interests: Vec<String>,
}
