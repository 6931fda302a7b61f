use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::bed::BedId;
use crate::code::ConfirmationCode;
use crate::language::Language;
use crate::time::minutes_until;

/// Reservation lifecycle status.
///
/// Created `active`; every other status is terminal and never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    CheckedIn,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReservationStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reservation: a time-bounded hold on a specific bed for a named
/// caller.
///
/// A bed in `held` status has exactly one `active` reservation and a bed in
/// `occupied` status exactly one `checked_in` reservation; the reservation
/// service maintains that coherence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// The caller's handle for follow-up, unique across all reservations.
    pub code: ConfirmationCode,
    pub bed_id: BedId,
    pub caller_name: String,
    /// Free text: the caller's situation as given during intake.
    pub situation: String,
    /// Free text: immediate needs mentioned (medical, recovery, none).
    pub needs: String,
    pub language: Language,
    /// Opaque reference for the duplicate-caller guard. Never a raw phone
    /// number; hashing happens upstream of the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_ref: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Set when the reservation reaches a terminal transition, and at
    /// check-out for a `checked_in` reservation.
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub terminal_at: Option<OffsetDateTime>,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Create a new `active` reservation. `expires_at` must be after
    /// `created_at`; the allocation engine guarantees it by construction.
    pub fn new(
        code: ConfirmationCode,
        bed_id: BedId,
        caller_name: impl Into<String>,
        situation: impl Into<String>,
        needs: impl Into<String>,
        language: Language,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Self {
        debug_assert!(expires_at > created_at);
        Self {
            code,
            bed_id,
            caller_name: caller_name.into(),
            situation: situation.into(),
            needs: needs.into(),
            language,
            caller_ref: None,
            created_at,
            expires_at,
            terminal_at: None,
            status: ReservationStatus::Active,
        }
    }

    pub fn with_caller_ref(mut self, caller_ref: impl Into<String>) -> Self {
        self.caller_ref = Some(caller_ref.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the hold deadline has passed at `now`. Only meaningful for
    /// `active` reservations; the sweeper uses it, check-in does not (a
    /// late arrival may still be deliberately checked in before the sweep).
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Remaining hold time in whole minutes, computed at read time.
    pub fn remaining_minutes(&self, now: OffsetDateTime) -> i64 {
        minutes_until(now, self.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now_utc;
    use time::Duration;

    fn sample(now: OffsetDateTime) -> Reservation {
        Reservation::new(
            ConfirmationCode::generate(),
            BedId::new(5).unwrap(),
            "John Smith",
            "eviction",
            "",
            Language::English,
            now,
            now + Duration::hours(3),
        )
    }

    #[test]
    fn new_reservation_is_active() {
        let r = sample(now_utc());
        assert_eq!(r.status, ReservationStatus::Active);
        assert!(!r.is_terminal());
        assert!(r.terminal_at.is_none());
    }

    #[test]
    fn expiry_and_remaining_time() {
        let now = now_utc();
        let r = sample(now);
        assert!(!r.is_expired_at(now + Duration::hours(2)));
        assert!(r.is_expired_at(now + Duration::hours(3) + Duration::seconds(30)));
        assert_eq!(r.remaining_minutes(now), 180);
        assert_eq!(r.remaining_minutes(now + Duration::hours(4)), 0);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::CheckedIn).unwrap(),
            "\"checked_in\""
        );
    }
}
