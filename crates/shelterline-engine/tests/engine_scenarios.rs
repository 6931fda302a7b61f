use std::sync::Arc;

use time::Duration;

use shelterline_core::{
    BedId, BedStatus, EventBroadcaster, Language, ReservationStatus, ShelterEvent,
    TOTAL_BEDS,
};
use shelterline_db_memory::InMemoryShelterStore;
use shelterline_engine::{
    AllocationRequest, EngineError, ExpirationScheduler, ReservationService,
};

fn request(name: &str) -> AllocationRequest {
    AllocationRequest {
        caller_name: name.to_string(),
        situation: "eviction".to_string(),
        needs: String::new(),
        language: Language::English,
        caller_ref: None,
    }
}

async fn service_with_hold(hold: Duration) -> Arc<ReservationService> {
    let store = Arc::new(InMemoryShelterStore::new());
    let service = Arc::new(ReservationService::new(
        store.clone(),
        store,
        hold,
        8,
        EventBroadcaster::new(),
    ));
    service.initialize().await.unwrap();
    service
}

async fn service() -> Arc<ReservationService> {
    service_with_hold(Duration::hours(3)).await
}

fn bed(id: i64) -> BedId {
    BedId::new(id).unwrap()
}

#[tokio::test]
async fn s1_happy_path_allocates_bed_one() {
    let service = service().await;
    let reservation = service.create(request("John Smith")).await.unwrap();

    assert_eq!(reservation.bed_id, bed(1));
    assert_eq!(reservation.status, ReservationStatus::Active);
    assert_eq!(
        reservation.expires_at,
        reservation.created_at + Duration::hours(3)
    );
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Held);

    let active = service.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].bed_id, bed(1));

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.available, 107);
    assert_eq!(summary.held, 1);
    assert_eq!(summary.total, TOTAL_BEDS);
}

#[tokio::test]
async fn s2_check_in_consumes_reservation() {
    let service = service().await;
    let reservation = service.create(request("John Smith")).await.unwrap();

    let outcome = service
        .check_in(bed(1), Some(&reservation.code))
        .await
        .unwrap();
    assert_eq!(
        outcome.reservation().status,
        ReservationStatus::CheckedIn
    );
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Occupied);

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.available, 107);
    assert_eq!(summary.occupied, 1);
    assert!(service.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn s3_expiration_releases_the_bed() {
    let service = service_with_hold(Duration::milliseconds(5)).await;
    let reservation = service.create(request("John Smith")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(25)).await;

    let scheduler = ExpirationScheduler::new(
        service.clone(),
        std::time::Duration::from_secs(30),
    );
    let expired = scheduler.sweep_once().await.unwrap();
    assert_eq!(expired, 1);

    let stored = service.get(&reservation.code).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Expired);
    assert!(stored.terminal_at.is_some());
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Available);
    assert_eq!(service.summary().await.unwrap().available, TOTAL_BEDS);

    // Idempotent: a second sweep with no new expirations is a no-op.
    assert_eq!(scheduler.sweep_once().await.unwrap(), 0);
}

#[tokio::test]
async fn s4_cancel_and_check_in_race_has_exactly_one_winner() {
    for _ in 0..16 {
        let service = service().await;
        let reservation = service.create(request("John Smith")).await.unwrap();
        let code = reservation.code.clone();

        let cancel = {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move { service.cancel(&code).await.map(|_| ()) })
        };
        let check_in = {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move {
                service.check_in(bed(1), Some(&code)).await.map(|_| ())
            })
        };

        let cancel = cancel.await.unwrap();
        let check_in = check_in.await.unwrap();
        assert!(
            cancel.is_ok() ^ check_in.is_ok(),
            "exactly one of cancel/check-in must win: cancel={cancel:?} check_in={check_in:?}"
        );

        let status = service.bed_status(bed(1)).await.unwrap();
        let stored = service.get(&code).await.unwrap().unwrap();
        if cancel.is_ok() {
            assert_eq!(status, BedStatus::Available);
            assert_eq!(stored.status, ReservationStatus::Cancelled);
        } else {
            assert_eq!(status, BedStatus::Occupied);
            assert_eq!(stored.status, ReservationStatus::CheckedIn);
        }
    }
}

#[tokio::test]
async fn s5_exhausted_capacity_reports_no_capacity_without_side_effect() {
    let service = service().await;
    for i in 0..usize::from(TOTAL_BEDS) {
        service.create(request(&format!("Caller {i}"))).await.unwrap();
    }

    let err = service.create(request("One More")).await.unwrap_err();
    assert!(matches!(err, EngineError::NoCapacity));

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.available, 0);
    assert_eq!(summary.held, TOTAL_BEDS);
    assert_eq!(
        service.list_active().await.unwrap().len(),
        usize::from(TOTAL_BEDS)
    );
}

#[tokio::test]
async fn allocation_is_deterministic_lowest_id() {
    let service = service().await;
    // Hold everything except beds 5, 9 and 17.
    for id in 1..=i64::from(TOTAL_BEDS) {
        if id != 5 && id != 9 && id != 17 {
            service.hold(bed(id)).await.unwrap();
        }
    }

    let reservation = service.create(request("John Smith")).await.unwrap();
    assert_eq!(reservation.bed_id, bed(5));
}

#[tokio::test]
async fn concurrent_allocations_never_double_book() {
    let service = service().await;
    let mut handles = Vec::new();
    for i in 0..140usize {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.create(request(&format!("Caller {i}"))).await
        }));
    }

    let mut beds_seen = std::collections::HashSet::new();
    let mut granted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reservation) => {
                granted += 1;
                assert!(
                    beds_seen.insert(reservation.bed_id),
                    "bed {} allocated twice",
                    reservation.bed_id
                );
            }
            Err(EngineError::NoCapacity) => refused += 1,
            Err(other) => panic!("unexpected allocation error: {other}"),
        }
    }

    assert_eq!(granted, usize::from(TOTAL_BEDS));
    assert_eq!(refused, 140 - usize::from(TOTAL_BEDS));

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.held, TOTAL_BEDS);
    assert_eq!(summary.available + summary.held + summary.occupied, TOTAL_BEDS);
}

#[tokio::test]
async fn cancel_is_idempotent_and_checkin_after_cancel_conflicts() {
    let service = service().await;
    let reservation = service.create(request("John Smith")).await.unwrap();

    service.cancel(&reservation.code).await.unwrap();
    // Second cancel is a no-op with the same outcome.
    let again = service.cancel(&reservation.code).await.unwrap();
    assert_eq!(again.status, ReservationStatus::Cancelled);
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Available);

    let err = service
        .check_in(bed(1), Some(&reservation.code))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn check_in_twice_and_check_out_twice_are_idempotent() {
    let service = service().await;
    let reservation = service.create(request("John Smith")).await.unwrap();

    service
        .check_in(bed(1), Some(&reservation.code))
        .await
        .unwrap();
    let second = service
        .check_in(bed(1), Some(&reservation.code))
        .await
        .unwrap();
    assert_eq!(second.reservation().status, ReservationStatus::CheckedIn);
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Occupied);

    service.check_out(bed(1)).await.unwrap();
    service.check_out(bed(1)).await.unwrap();
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Available);

    // Check-out stamps the departure but leaves the satisfied status.
    let stored = service.get(&reservation.code).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::CheckedIn);
    assert!(stored.terminal_at.is_some());
}

#[tokio::test]
async fn manual_hold_is_released_but_reserved_holds_are_not() {
    let service = service().await;

    // A bare staff hold releases cleanly.
    service.hold(bed(3)).await.unwrap();
    assert_eq!(service.bed_status(bed(3)).await.unwrap(), BedStatus::Held);
    service.release(bed(3)).await.unwrap();
    assert_eq!(service.bed_status(bed(3)).await.unwrap(), BedStatus::Available);

    // A hold backed by an active reservation is refused; the reservation
    // owns that bed until cancel, check-in, or expiry.
    let reservation = service.create(request("John Smith")).await.unwrap();
    let err = service.release(reservation.bed_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(
        service.bed_status(reservation.bed_id).await.unwrap(),
        BedStatus::Held
    );

    // Releasing a bed that is not held conflicts, with no side effect.
    let err = service.release(bed(4)).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(service.bed_status(bed(4)).await.unwrap(), BedStatus::Available);
}

#[tokio::test]
async fn check_in_rejects_wrong_bed() {
    let service = service().await;
    let reservation = service.create(request("John Smith")).await.unwrap();

    let err = service
        .check_in(bed(2), Some(&reservation.code))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::BedMismatch { expected: 1, given: 2, .. }
    ));
    // No side effect on either bed.
    assert_eq!(service.bed_status(bed(1)).await.unwrap(), BedStatus::Held);
    assert_eq!(service.bed_status(bed(2)).await.unwrap(), BedStatus::Available);
}

#[tokio::test]
async fn walk_in_creates_a_coherent_checked_in_record() {
    let service = service().await;
    let outcome = service.check_in(bed(40), None).await.unwrap();

    let reservation = outcome.reservation();
    assert_eq!(reservation.bed_id, bed(40));
    assert_eq!(reservation.status, ReservationStatus::CheckedIn);
    assert_eq!(service.bed_status(bed(40)).await.unwrap(), BedStatus::Occupied);

    // A second walk-in on the same bed conflicts.
    let err = service.check_in(bed(40), None).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_caller_is_refused_before_any_state_change() {
    let service = service().await;
    let mut first = request("John Smith");
    first.caller_ref = Some("caller-a".to_string());
    service.create(first.clone()).await.unwrap();

    let err = service.create(first).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateCaller));
    assert_eq!(service.summary().await.unwrap().held, 1);
}

#[tokio::test]
async fn create_emits_events_after_commit() {
    let store = Arc::new(InMemoryShelterStore::new());
    let events = EventBroadcaster::new();
    let mut rx = events.subscribe();
    let service = ReservationService::new(
        store.clone(),
        store,
        Duration::hours(3),
        8,
        events,
    );
    service.initialize().await.unwrap();

    let reservation = service.create(request("John Smith")).await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(
        first,
        ShelterEvent::BedStatusChanged {
            bed_id: bed(1),
            from: BedStatus::Available,
            to: BedStatus::Held,
        }
    );
    let second = rx.recv().await.unwrap();
    assert_eq!(
        second,
        ShelterEvent::ReservationCreated {
            code: reservation.code.clone(),
            bed_id: bed(1),
        }
    );
}
