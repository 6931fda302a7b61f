//! Core domain model for Shelterline.
//!
//! This crate defines the types shared by every other Shelterline crate:
//! the bed and reservation model with their canonical status enumerations,
//! confirmation codes, supported caller languages, core error types, and
//! the in-process event bus that state changes are published on.
//!
//! Status enumerations are closed and canonical: they serialize to
//! lowercase snake_case at the wire boundary and nowhere else.

pub mod bed;
pub mod chapel;
pub mod code;
pub mod error;
pub mod events;
pub mod language;
pub mod reservation;
pub mod time;
pub mod volunteer;

pub use bed::{BedId, BedStatus, TOTAL_BEDS};
pub use chapel::{ChapelBooking, ChapelStatus};
pub use code::ConfirmationCode;
pub use error::{CoreError, Result};
pub use events::{EventBroadcaster, ShelterEvent};
pub use language::Language;
pub use reservation::{Reservation, ReservationStatus};
pub use time::now_utc;
pub use volunteer::{Volunteer, VolunteerStatus};
