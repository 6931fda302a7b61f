use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use shelterline_core::{now_utc, BedStatus, ReservationStatus, ShelterEvent};

use crate::error::Result;
use crate::reservation::ReservationService;

/// Time-driven release of lapsed holds.
///
/// A pull-based periodic sweep rather than per-reservation timers: one
/// coarse loop survives restarts without state and tolerates clock
/// adjustments, and worst-case lateness equals the tick, which is
/// negligible against a 3-hour hold.
pub struct ExpirationScheduler {
    service: Arc<ReservationService>,
    tick: Duration,
}

impl ExpirationScheduler {
    pub fn new(service: Arc<ReservationService>, tick: Duration) -> Self {
        Self { service, tick }
    }

    /// Run the sweep loop forever. The first tick fires immediately, which
    /// doubles as the startup backlog sweep; if a sweep overruns the tick,
    /// the missed tick is skipped rather than piled up.
    pub async fn run(self) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_secs = self.tick.as_secs(), "expiration scheduler started");

        loop {
            ticker.tick().await;
            match self.sweep_once().await {
                Ok(expired) => {
                    if expired > 0 {
                        info!(count = expired, "expired reservations");
                    }
                }
                Err(err) => {
                    error!(error = %err, "expiration sweep failed");
                }
            }
        }
    }

    /// One sweep: expire every `active` reservation whose deadline has
    /// passed and release its bed. Losing a compare-and-set to a racing
    /// check-in or cancel leaves the winner's effect in place; running
    /// again with no new expirations is a no-op.
    pub async fn sweep_once(&self) -> Result<usize> {
        let now = now_utc();
        let overdue = self.service.store().list_expiring_before(now).await?;
        let mut count = 0;

        for reservation in overdue {
            let expired = match self
                .service
                .store()
                .update_status(
                    &reservation.code,
                    ReservationStatus::Active,
                    ReservationStatus::Expired,
                    Some(now),
                )
                .await
            {
                Ok(expired) => expired,
                Err(err) if err.is_conflict() => {
                    debug!(code = %reservation.code, "expiry lost to a racing check-in or cancel");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if let Err(err) = self
                .service
                .registry()
                .transition(expired.bed_id, BedStatus::Held, BedStatus::Available)
                .await
            {
                // The expiry CAS was won, so the bed should have been held.
                error!(
                    bed_id = %expired.bed_id,
                    code = %expired.code,
                    error = %err,
                    "bed/reservation coherence violation during expiry"
                );
                continue;
            }

            count += 1;
            self.service.events().send(ShelterEvent::BedStatusChanged {
                bed_id: expired.bed_id,
                from: BedStatus::Held,
                to: BedStatus::Available,
            });
            self.service.events().send(ShelterEvent::ReservationExpired {
                code: expired.code.clone(),
                bed_id: expired.bed_id,
            });
        }

        Ok(count)
    }
}
