//! The Shelterline allocation and lifecycle engine.
//!
//! Composes the bed registry and reservation store into the public
//! operations staff clients and the voice agent drive: atomic allocation
//! of the lowest available bed, the reservation lifecycle
//! (create / cancel / check-in / check-out), the time-driven expiration
//! sweep, and the chapel and volunteer services the voice tools commit
//! into.
//!
//! Every multi-step mutation happens under the engine's critical section
//! over the in-process {registry, store} pair, and state-change events are
//! published only after the mutation commits.

mod allocation;
mod chapel;
mod error;
mod expiration;
mod reservation;
mod volunteer;

pub use allocation::{AllocationEngine, AllocationRequest};
pub use chapel::ChapelService;
pub use error::{EngineError, Result};
pub use expiration::ExpirationScheduler;
pub use reservation::{BedSummary, CheckInOutcome, ReservationService};
pub use volunteer::VolunteerService;
