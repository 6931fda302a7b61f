use std::sync::Arc;

use serde::Serialize;
use time::Duration;
use tracing::{error, info};

use shelterline_core::{
    now_utc, BedId, BedStatus, ConfirmationCode, EventBroadcaster, Reservation,
    ReservationStatus, ShelterEvent, TOTAL_BEDS,
};
use shelterline_storage::{BedRegistry, ReservationStore};

use crate::allocation::{AllocationEngine, AllocationRequest};
use crate::error::{EngineError, Result};

/// Availability summary for dashboards and the voice agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BedSummary {
    pub available: u16,
    pub held: u16,
    pub occupied: u16,
    pub total: u16,
}

/// What a check-in consumed.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    /// An active reservation was converted.
    Reserved(Reservation),
    /// No reservation code given; the bed was available and a walk-in
    /// record was created so bed/reservation coherence holds.
    WalkIn(Reservation),
}

impl CheckInOutcome {
    pub fn reservation(&self) -> &Reservation {
        match self {
            CheckInOutcome::Reserved(r) | CheckInOutcome::WalkIn(r) => r,
        }
    }
}

/// Public reservation operations: the single composition point of the bed
/// registry and the reservation store.
///
/// Every operation is one atomic unit over both; callers never observe a
/// bed whose status disagrees with its reservation. Events are emitted
/// after the mutation commits, never inside it.
pub struct ReservationService {
    registry: Arc<dyn BedRegistry>,
    store: Arc<dyn ReservationStore>,
    allocator: AllocationEngine,
    hold_duration: Duration,
    events: EventBroadcaster,
}

impl ReservationService {
    pub fn new(
        registry: Arc<dyn BedRegistry>,
        store: Arc<dyn ReservationStore>,
        hold_duration: Duration,
        retry_max: u32,
        events: EventBroadcaster,
    ) -> Self {
        let allocator = AllocationEngine::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            hold_duration,
            retry_max,
        );
        Self {
            registry,
            store,
            allocator,
            hold_duration,
            events,
        }
    }

    /// Seed the bed table and verify the capacity invariant. Fatal at
    /// startup on violation.
    pub async fn initialize(&self) -> Result<()> {
        self.registry.initialize().await?;
        let snapshot = self.registry.snapshot().await?;
        if snapshot.len() != usize::from(TOTAL_BEDS) {
            return Err(EngineError::internal(format!(
                "bed registry holds {} beds, expected {TOTAL_BEDS}",
                snapshot.len()
            )));
        }
        Ok(())
    }

    /// Availability counts. The three statuses always sum to 108.
    pub async fn summary(&self) -> Result<BedSummary> {
        let snapshot = self.registry.snapshot().await?;
        let mut summary = BedSummary {
            available: 0,
            held: 0,
            occupied: 0,
            total: TOTAL_BEDS,
        };
        for row in &snapshot {
            match row.status {
                BedStatus::Available => summary.available += 1,
                BedStatus::Held => summary.held += 1,
                BedStatus::Occupied => summary.occupied += 1,
            }
        }
        Ok(summary)
    }

    pub async fn bed_list(&self) -> Result<Vec<shelterline_storage::BedRow>> {
        Ok(self.registry.snapshot().await?)
    }

    pub async fn bed_status(&self, bed_id: BedId) -> Result<BedStatus> {
        Ok(self.registry.get_status(bed_id).await?)
    }

    /// Allocate a bed and create an `active` reservation.
    pub async fn create(&self, request: AllocationRequest) -> Result<Reservation> {
        let reservation = self.allocator.allocate(request).await?;
        info!(code = %reservation.code, bed_id = %reservation.bed_id, "reservation created");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id: reservation.bed_id,
            from: BedStatus::Available,
            to: BedStatus::Held,
        });
        self.events.send(ShelterEvent::ReservationCreated {
            code: reservation.code.clone(),
            bed_id: reservation.bed_id,
        });
        Ok(reservation)
    }

    /// Cancel an active reservation and release its bed. Idempotent: a
    /// second cancel is a no-op. A reservation that already checked in or
    /// expired keeps the winner's effect and reports it.
    pub async fn cancel(&self, code: &ConfirmationCode) -> Result<Reservation> {
        let existing = self
            .store
            .get_by_code(code)
            .await?
            .ok_or_else(|| EngineError::not_found("reservation", code.as_str()))?;
        match existing.status {
            ReservationStatus::Active => {}
            ReservationStatus::Cancelled => return Ok(existing),
            ReservationStatus::CheckedIn => {
                return Err(EngineError::conflict(format!(
                    "reservation {code} already checked in"
                )));
            }
            ReservationStatus::Expired => {
                return Err(EngineError::Expired(code.as_str().to_string()));
            }
        }

        let cancelled = self
            .store
            .update_status(
                code,
                ReservationStatus::Active,
                ReservationStatus::Cancelled,
                Some(now_utc()),
            )
            .await?;

        if let Err(err) = self
            .registry
            .transition(cancelled.bed_id, BedStatus::Held, BedStatus::Available)
            .await
        {
            // The reservation CAS was won, so the bed must have been held.
            error!(
                bed_id = %cancelled.bed_id,
                code = %code,
                error = %err,
                "bed/reservation coherence violation during cancel"
            );
            return Err(EngineError::internal(err.to_string()));
        }

        info!(code = %code, bed_id = %cancelled.bed_id, "reservation cancelled");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id: cancelled.bed_id,
            from: BedStatus::Held,
            to: BedStatus::Available,
        });
        self.events.send(ShelterEvent::ReservationCancelled {
            code: cancelled.code.clone(),
            bed_id: cancelled.bed_id,
        });
        Ok(cancelled)
    }

    /// Check a guest in, consuming their reservation.
    ///
    /// With a code, the reservation must be `active` and reference
    /// `bed_id`. A late arrival whose hold has lapsed but not yet been
    /// swept may still be checked in deliberately. Without a code this is
    /// a walk-in: the bed must be `available` and a synthetic `checked_in`
    /// reservation is created.
    pub async fn check_in(
        &self,
        bed_id: BedId,
        code: Option<&ConfirmationCode>,
    ) -> Result<CheckInOutcome> {
        match code {
            Some(code) => self.check_in_reserved(bed_id, code).await,
            None => self.walk_in(bed_id).await,
        }
    }

    async fn check_in_reserved(
        &self,
        bed_id: BedId,
        code: &ConfirmationCode,
    ) -> Result<CheckInOutcome> {
        let existing = self
            .store
            .get_by_code(code)
            .await?
            .ok_or_else(|| EngineError::not_found("reservation", code.as_str()))?;

        if existing.bed_id != bed_id {
            return Err(EngineError::BedMismatch {
                code: code.as_str().to_string(),
                expected: existing.bed_id.get(),
                given: bed_id.get(),
            });
        }
        match existing.status {
            ReservationStatus::Active => {}
            // Second check-in of the same reservation is a no-op.
            ReservationStatus::CheckedIn => {
                return Ok(CheckInOutcome::Reserved(existing));
            }
            ReservationStatus::Expired => {
                return Err(EngineError::Expired(code.as_str().to_string()));
            }
            ReservationStatus::Cancelled => {
                return Err(EngineError::conflict(format!(
                    "reservation {code} was cancelled"
                )));
            }
        }

        let checked_in = self
            .store
            .update_status(
                code,
                ReservationStatus::Active,
                ReservationStatus::CheckedIn,
                Some(now_utc()),
            )
            .await?;

        if let Err(err) = self
            .registry
            .transition(bed_id, BedStatus::Held, BedStatus::Occupied)
            .await
        {
            error!(
                bed_id = %bed_id,
                code = %code,
                error = %err,
                "bed/reservation coherence violation during check-in"
            );
            return Err(EngineError::internal(err.to_string()));
        }

        info!(code = %code, bed_id = %bed_id, "guest checked in");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id,
            from: BedStatus::Held,
            to: BedStatus::Occupied,
        });
        self.events.send(ShelterEvent::ReservationCheckedIn {
            code: checked_in.code.clone(),
            bed_id,
        });
        Ok(CheckInOutcome::Reserved(checked_in))
    }

    async fn walk_in(&self, bed_id: BedId) -> Result<CheckInOutcome> {
        self.registry
            .transition(bed_id, BedStatus::Available, BedStatus::Occupied)
            .await
            .map_err(|err| {
                if err.is_conflict() {
                    EngineError::conflict(format!("bed {bed_id} is not available for walk-in"))
                } else {
                    err.into()
                }
            })?;

        let now = now_utc();
        let mut reservation = Reservation::new(
            ConfirmationCode::generate(),
            bed_id,
            "Front-desk walk-in",
            "Checked in at front desk",
            "Not specified",
            shelterline_core::Language::English,
            now,
            now + self.hold_duration,
        );
        reservation.status = ReservationStatus::CheckedIn;
        reservation.terminal_at = Some(now);

        let mut code_attempt = 0;
        while let Err(err) = self.store.insert(reservation.clone()).await {
            code_attempt += 1;
            let collision = matches!(err, shelterline_storage::StorageError::AlreadyExists { .. });
            if !collision || code_attempt > 16 {
                // Roll the bed back rather than leave it occupied with no
                // reservation.
                let _ = self
                    .registry
                    .transition(bed_id, BedStatus::Occupied, BedStatus::Available)
                    .await;
                return Err(err.into());
            }
            reservation.code = ConfirmationCode::generate();
        }

        info!(bed_id = %bed_id, code = %reservation.code, "walk-in checked in");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id,
            from: BedStatus::Available,
            to: BedStatus::Occupied,
        });
        self.events.send(ShelterEvent::ReservationCheckedIn {
            code: reservation.code.clone(),
            bed_id,
        });
        Ok(CheckInOutcome::WalkIn(reservation))
    }

    /// Check a guest out, freeing the bed. The `checked_in` reservation
    /// keeps its status (it has already satisfied) and gets its departure
    /// stamped. Idempotent: a bed already `available` is a no-op.
    pub async fn check_out(&self, bed_id: BedId) -> Result<()> {
        let resident = self.store.get_checked_in_by_bed(bed_id).await?;

        match self
            .registry
            .transition(bed_id, BedStatus::Occupied, BedStatus::Available)
            .await
        {
            Ok(()) => {}
            Err(err) if err.is_conflict() => {
                let status = self.registry.get_status(bed_id).await?;
                return match status {
                    BedStatus::Available => Ok(()),
                    _ => Err(EngineError::conflict(format!(
                        "bed {bed_id} is {status}, not occupied"
                    ))),
                };
            }
            Err(err) => return Err(err.into()),
        }

        if let Some(resident) = resident {
            self.store
                .set_terminal_at(&resident.code, now_utc())
                .await?;
        }

        info!(bed_id = %bed_id, "guest checked out");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id,
            from: BedStatus::Occupied,
            to: BedStatus::Available,
        });
        Ok(())
    }

    /// Manual staff hold on a specific bed. A bare bed-state transition;
    /// deliberately no shadow reservation.
    pub async fn hold(&self, bed_id: BedId) -> Result<()> {
        self.registry
            .transition(bed_id, BedStatus::Available, BedStatus::Held)
            .await
            .map_err(|err| {
                if err.is_conflict() {
                    EngineError::conflict(format!("bed {bed_id} is not available"))
                } else {
                    err.into()
                }
            })?;
        info!(bed_id = %bed_id, "manual hold placed");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id,
            from: BedStatus::Available,
            to: BedStatus::Held,
        });
        Ok(())
    }

    /// Release a manually-held bed back to `available`; the counterpart of
    /// [`ReservationService::hold`]. A bed whose hold is backed by an
    /// active reservation is refused — that hold ends by cancelling the
    /// reservation, keeping bed and reservation coherent.
    pub async fn release(&self, bed_id: BedId) -> Result<()> {
        if let Some(reservation) = self.store.get_active_by_bed(bed_id).await? {
            return Err(EngineError::conflict(format!(
                "bed {bed_id} is held by reservation {}; cancel it instead",
                reservation.code
            )));
        }

        self.registry
            .transition(bed_id, BedStatus::Held, BedStatus::Available)
            .await
            .map_err(|err| {
                if err.is_conflict() {
                    EngineError::conflict(format!("bed {bed_id} is not held"))
                } else {
                    err.into()
                }
            })?;
        info!(bed_id = %bed_id, "manual hold released");
        self.events.send(ShelterEvent::BedStatusChanged {
            bed_id,
            from: BedStatus::Held,
            to: BedStatus::Available,
        });
        Ok(())
    }

    /// Currently `active` reservations in creation order.
    pub async fn list_active(&self) -> Result<Vec<Reservation>> {
        Ok(self.store.list_active().await?)
    }

    pub async fn get(&self, code: &ConfirmationCode) -> Result<Option<Reservation>> {
        Ok(self.store.get_by_code(code).await?)
    }

    pub(crate) fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    pub(crate) fn registry(&self) -> &Arc<dyn BedRegistry> {
        &self.registry
    }

    pub(crate) fn events(&self) -> &EventBroadcaster {
        &self.events
    }
}
