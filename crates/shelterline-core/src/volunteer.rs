use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Volunteer record status. New registrations start `pending` until staff
/// complete screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerStatus {
    Pending,
    Active,
    Inactive,
}

/// A volunteer registration captured by the voice agent or staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: u64,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    /// Days or shifts the volunteer offered, e.g. "weekends", "tuesday".
    pub availability: Vec<String>,
    /// Service areas of interest, e.g. "kitchen", "chapel", "intake".
    pub interests: Vec<String>,
    pub status: VolunteerStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
