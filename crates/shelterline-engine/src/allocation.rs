use std::sync::Arc;
use std::time::Duration as StdDuration;

use rand::Rng;
use time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shelterline_core::{now_utc, BedStatus, ConfirmationCode, Language, Reservation};
use shelterline_storage::{BedRegistry, ReservationStore, StorageError};

use crate::error::{EngineError, Result};

/// Intake details for one allocation.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub caller_name: String,
    pub situation: String,
    pub needs: String,
    pub language: Language,
    /// Opaque caller reference for the one-active-reservation guard.
    pub caller_ref: Option<String>,
}

/// Atomically picks an available bed and installs an `active` reservation
/// on it.
///
/// Candidate selection is deterministic: the lowest-numbered `available`
/// bed. That keeps allocations replayable and concentrates occupancy in a
/// stable range for staff.
///
/// The pick-verify-hold-insert sequence runs under a process-wide mutex
/// over the in-process {registry, store} pair. The registry's
/// compare-and-set still backstops racing writers that do not take the
/// mutex (manual holds from the staff API), so a lost race is retried with
/// a short jittered backoff up to `retry_max` times.
pub struct AllocationEngine {
    registry: Arc<dyn BedRegistry>,
    store: Arc<dyn ReservationStore>,
    guard: Mutex<()>,
    hold_duration: Duration,
    retry_max: u32,
}

/// Regeneration attempts for a colliding confirmation code before the
/// allocation fails. The four-digit space makes collisions rare; hitting
/// this cap means the code space is effectively exhausted.
const CODE_RETRY_MAX: u32 = 16;

impl AllocationEngine {
    pub fn new(
        registry: Arc<dyn BedRegistry>,
        store: Arc<dyn ReservationStore>,
        hold_duration: Duration,
        retry_max: u32,
    ) -> Self {
        Self {
            registry,
            store,
            guard: Mutex::new(()),
            hold_duration,
            retry_max,
        }
    }

    /// Allocate the lowest available bed for the caller.
    ///
    /// On success the bed is `held` and exactly one `active` reservation
    /// references it, with `expires_at = now + hold_duration`. On any
    /// failure no partial effect remains visible.
    pub async fn allocate(&self, request: AllocationRequest) -> Result<Reservation> {
        if let Some(caller_ref) = request.caller_ref.as_deref() {
            if self
                .store
                .get_active_by_caller_ref(caller_ref)
                .await?
                .is_some()
            {
                return Err(EngineError::DuplicateCaller);
            }
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_allocate(&request).await {
                Ok(reservation) => return Ok(reservation),
                Err(EngineError::Conflict(reason)) if attempt < self.retry_max => {
                    debug!(attempt, %reason, "allocation lost a race, retrying");
                    tokio::time::sleep(jitter(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One pick-verify-hold-insert attempt under the critical section.
    async fn try_allocate(&self, request: &AllocationRequest) -> Result<Reservation> {
        let _guard = self.guard.lock().await;

        let snapshot = self.registry.snapshot().await?;
        let Some(bed_id) = snapshot
            .iter()
            .find(|row| row.status == BedStatus::Available)
            .map(|row| row.bed_id)
        else {
            return Err(EngineError::NoCapacity);
        };

        // Re-verify and hold in one CAS. A racing manual hold between the
        // snapshot and here surfaces as a conflict and is retried.
        self.registry
            .transition(bed_id, BedStatus::Available, BedStatus::Held)
            .await?;

        let now = now_utc();
        let mut reservation = Reservation::new(
            ConfirmationCode::generate(),
            bed_id,
            request.caller_name.clone(),
            request.situation.clone(),
            request.needs.clone(),
            request.language,
            now,
            now + self.hold_duration,
        );
        if let Some(caller_ref) = &request.caller_ref {
            reservation = reservation.with_caller_ref(caller_ref.clone());
        }

        let mut code_attempt = 0;
        loop {
            match self.store.insert(reservation.clone()).await {
                Ok(()) => return Ok(reservation),
                Err(StorageError::AlreadyExists { .. }) if code_attempt < CODE_RETRY_MAX => {
                    code_attempt += 1;
                    reservation.code = ConfirmationCode::generate();
                }
                Err(err) => {
                    // The bed was held above; release it so the failure
                    // leaves no partial effect.
                    if let Err(rollback) = self
                        .registry
                        .transition(bed_id, BedStatus::Held, BedStatus::Available)
                        .await
                    {
                        warn!(%bed_id, error = %rollback, "failed to release bed after aborted allocation");
                    }
                    return Err(err.into());
                }
            }
        }
    }
}

/// Small per-attempt backoff so racing allocators spread out.
fn jitter(attempt: u32) -> StdDuration {
    let base = u64::from(attempt.min(8));
    let noise: u64 = rand::thread_rng().gen_range(0..8);
    StdDuration::from_millis(base * 2 + noise)
}
