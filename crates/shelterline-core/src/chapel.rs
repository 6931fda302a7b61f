use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Chapel booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapelStatus {
    Pending,
    Confirmed,
    Cancelled,
}

time::serde::format_description!(chapel_date, Date, "[year]-[month]-[day]");

/// A scheduled chapel service led by a visiting group.
///
/// Weekday slots only; the service stores start times, not durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapelBooking {
    pub id: u64,
    #[serde(with = "chapel_date")]
    pub date: Date,
    /// Start time in `HH:MM`, validated against the configured slot set.
    pub time: String,
    pub group_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
    pub status: ChapelStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChapelBooking {
    /// Whether this booking blocks its (date, time) slot. Cancelled
    /// bookings do not.
    pub fn occupies_slot(&self) -> bool {
        self.status != ChapelStatus::Cancelled
    }
}
