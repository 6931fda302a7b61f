use std::sync::Arc;

use time::Weekday;
use tracing::info;

use shelterline_core::ChapelBooking;
use shelterline_storage::{ChapelStore, NewChapelBooking};

use crate::error::{EngineError, Result};

/// Chapel scheduling: weekday services at a closed set of start times.
///
/// All validation happens here, never in the caller — the voice tool and
/// the staff route both go through `schedule`.
pub struct ChapelService {
    store: Arc<dyn ChapelStore>,
    time_slots: Vec<String>,
}

impl ChapelService {
    pub fn new(store: Arc<dyn ChapelStore>, time_slots: Vec<String>) -> Self {
        Self { store, time_slots }
    }

    /// Book a chapel slot.
    ///
    /// # Errors
    ///
    /// `WeekendDisallowed` for Saturday/Sunday dates, `InvalidTime` for a
    /// start time outside the configured slots, `SlotTaken` when a
    /// non-cancelled booking already occupies the (date, time) pair, and
    /// `Validation` for missing group or contact details. Nothing is
    /// inserted on any of them.
    pub async fn schedule(&self, booking: NewChapelBooking) -> Result<ChapelBooking> {
        if booking.group_name.trim().is_empty() {
            return Err(EngineError::validation("group name is required"));
        }
        if booking.contact_name.trim().is_empty() || booking.contact_phone.trim().is_empty() {
            return Err(EngineError::validation("contact name and phone are required"));
        }
        if matches!(booking.date.weekday(), Weekday::Saturday | Weekday::Sunday) {
            return Err(EngineError::WeekendDisallowed);
        }
        if !self.time_slots.iter().any(|slot| slot == &booking.time) {
            return Err(EngineError::InvalidTime(booking.time.clone()));
        }
        if self
            .store
            .find_active_by_slot(booking.date, &booking.time)
            .await?
            .is_some()
        {
            return Err(EngineError::SlotTaken);
        }

        let booked = self.store.insert_booking(booking).await?;
        info!(id = booked.id, date = %booked.date, time = %booked.time, "chapel service scheduled");
        Ok(booked)
    }

    pub async fn list(&self) -> Result<Vec<ChapelBooking>> {
        Ok(self.store.list_bookings().await?)
    }
}
