use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use shelterline_core::{
    BedId, BedStatus, ChapelBooking, ConfirmationCode, Reservation, ReservationStatus, Volunteer,
};

use crate::error::StorageError;
use crate::types::{BedRow, NewChapelBooking, NewVolunteer};

/// The bed registry: owner of the 108-row `bed_id -> status` table.
///
/// The registry is the *only* writer of bed status. Every higher layer
/// mutates through [`BedRegistry::transition`], whose compare-and-set gives
/// each bed a total order of transitions. The registry knows nothing about
/// reservations; that coupling lives in the reservation service.
#[async_trait]
pub trait BedRegistry: Send + Sync {
    /// Idempotently ensure beds `1..=108` exist with status `available`
    /// where absent. Never overwrites an existing row.
    async fn initialize(&self) -> Result<(), StorageError>;

    /// A consistent snapshot of every bed, in id order.
    async fn snapshot(&self) -> Result<Vec<BedRow>, StorageError>;

    /// Current status of one bed.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if the bed id has no row (cannot happen
    /// after `initialize`, but the contract covers it).
    async fn get_status(&self, bed_id: BedId) -> Result<BedStatus, StorageError>;

    /// Compare-and-set transition.
    ///
    /// # Errors
    ///
    /// `StorageError::Conflict` if the current status is not `from`; the
    /// bed is left untouched.
    async fn transition(
        &self,
        bed_id: BedId,
        from: BedStatus,
        to: BedStatus,
    ) -> Result<(), StorageError>;
}

/// Durable record of every reservation and its lifecycle transitions.
///
/// Listings are ordered by creation timestamp with the code as tiebreaker.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Insert a new reservation.
    ///
    /// # Errors
    ///
    /// `StorageError::AlreadyExists` on a duplicate confirmation code; the
    /// allocation engine regenerates and retries.
    async fn insert(&self, reservation: Reservation) -> Result<(), StorageError>;

    async fn get_by_code(
        &self,
        code: &ConfirmationCode,
    ) -> Result<Option<Reservation>, StorageError>;

    /// The single `active` reservation on a bed, if any.
    async fn get_active_by_bed(&self, bed_id: BedId)
        -> Result<Option<Reservation>, StorageError>;

    /// The single `checked_in` reservation on a bed, if any. Used by
    /// check-out to stamp the departure.
    async fn get_checked_in_by_bed(
        &self,
        bed_id: BedId,
    ) -> Result<Option<Reservation>, StorageError>;

    /// An `active` reservation for the given opaque caller reference, if
    /// any. Backs the one-active-reservation-per-caller guard.
    async fn get_active_by_caller_ref(
        &self,
        caller_ref: &str,
    ) -> Result<Option<Reservation>, StorageError>;

    /// All `active` reservations.
    async fn list_active(&self) -> Result<Vec<Reservation>, StorageError>;

    /// All `active` reservations with `expires_at < t`. This is the
    /// expiration sweep's work list; backends should make it cheap
    /// (the SQL layout indexes `(status, expires_at)`).
    async fn list_expiring_before(
        &self,
        t: OffsetDateTime,
    ) -> Result<Vec<Reservation>, StorageError>;

    /// Compare-and-set on the lifecycle status. `terminal_at` is stored
    /// when the new status is terminal.
    ///
    /// Returns the updated reservation.
    ///
    /// # Errors
    ///
    /// `StorageError::Conflict` if the current status is not
    /// `expected_status`; `StorageError::NotFound` for an unknown code.
    async fn update_status(
        &self,
        code: &ConfirmationCode,
        expected_status: ReservationStatus,
        new_status: ReservationStatus,
        terminal_at: Option<OffsetDateTime>,
    ) -> Result<Reservation, StorageError>;

    /// Stamp `terminal_at` without changing status. Check-out uses this on
    /// the `checked_in` reservation, which has already satisfied its
    /// lifecycle.
    async fn set_terminal_at(
        &self,
        code: &ConfirmationCode,
        at: OffsetDateTime,
    ) -> Result<(), StorageError>;
}

/// Chapel bookings committed by the voice tool or staff.
#[async_trait]
pub trait ChapelStore: Send + Sync {
    async fn insert_booking(
        &self,
        booking: NewChapelBooking,
    ) -> Result<ChapelBooking, StorageError>;

    /// The non-cancelled booking occupying `(date, time)`, if any.
    async fn find_active_by_slot(
        &self,
        date: Date,
        time: &str,
    ) -> Result<Option<ChapelBooking>, StorageError>;

    /// All bookings ordered by `(date, time)`.
    async fn list_bookings(&self) -> Result<Vec<ChapelBooking>, StorageError>;
}

/// Volunteer registrations committed by the voice tool or staff.
#[async_trait]
pub trait VolunteerStore: Send + Sync {
    async fn insert_volunteer(&self, volunteer: NewVolunteer)
        -> Result<Volunteer, StorageError>;

    /// All volunteers ordered by name.
    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StorageError>;
}

/// Guest-record attachment point for occupied beds. The guest subsystem
/// itself lives elsewhere; the engine only stores the association.
#[async_trait]
pub trait GuestDirectory: Send + Sync {
    async fn assign_guest(&self, bed_id: BedId, guest_id: String) -> Result<(), StorageError>;

    async fn assigned_guest(&self, bed_id: BedId) -> Result<Option<String>, StorageError>;
}
