use serde_json::{json, Value};
use tokio::task::JoinHandle;

use shelterline_server::{build_app, AppConfig, AppState};

async fn start_server() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let state = AppState::from_config(AppConfig::default());
    state.reservations.initialize().await.expect("seed beds");
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{}", addr), tx, server)
}

#[tokio::test]
async fn health_and_bed_summary_endpoints() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/ready")).send().await.unwrap();
    assert!(resp.status().is_success());

    let resp = client.get(format!("{base}/api/beds/")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 108);
    assert_eq!(body["available"], 108);
    assert_eq!(body["held"], 0);
    assert_eq!(body["occupied"], 0);

    let resp = client
        .get(format!("{base}/api/beds/list"))
        .send()
        .await
        .unwrap();
    let beds: Value = resp.json().await.unwrap();
    assert_eq!(beds.as_array().unwrap().len(), 108);
    assert_eq!(beds[0]["bed_id"], 1);
    assert_eq!(beds[0]["status"], "available");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn reservation_lifecycle_over_http() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // Create
    let resp = client
        .post(format!("{base}/api/reservations/"))
        .json(&json!({
            "caller_name": "John Smith",
            "situation": "eviction",
            "language": "en"
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["bed_id"], 1);
    assert_eq!(created["status"], "active");
    let code = created["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("SL-"));
    assert!(created["time_remaining_minutes"].as_i64().unwrap() > 170);

    // Bed 1 is now held.
    let resp = client.get(format!("{base}/api/beds/1")).send().await.unwrap();
    let bed: Value = resp.json().await.unwrap();
    assert_eq!(bed["status"], "held");

    // Listed as active.
    let resp = client
        .get(format!("{base}/api/reservations/"))
        .send()
        .await
        .unwrap();
    let listed: Value = resp.json().await.unwrap();
    assert_eq!(listed["reservations"].as_array().unwrap().len(), 1);

    // Check in with the code.
    let resp = client
        .post(format!("{base}/api/beds/1/checkin?reservation_id={code}"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let checked: Value = resp.json().await.unwrap();
    assert_eq!(checked["status"], "checked_in");
    assert_eq!(checked["reservation"]["status"], "checked_in");

    // Cancelling after check-in conflicts.
    let resp = client
        .post(format!("{base}/api/reservations/{code}/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let err: Value = resp.json().await.unwrap();
    assert!(err["detail"].as_str().unwrap().contains("checked in"));

    // Check out frees the bed.
    let resp = client
        .post(format!("{base}/api/beds/1/checkout"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let resp = client.get(format!("{base}/api/beds/")).send().await.unwrap();
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["available"], 108);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn cancel_is_idempotent_over_http() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{base}/api/reservations/"))
        .json(&json!({ "caller_name": "Sam" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = created["code"].as_str().unwrap();

    for _ in 0..2 {
        let resp = client
            .post(format!("{base}/api/reservations/{code}/cancel"))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "cancelled");
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn validation_and_not_found_use_the_detail_envelope() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/reservations/"))
        .json(&json!({ "caller_name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["detail"], "caller_name is required");

    let resp = client
        .get(format!("{base}/api/reservations/SL-0000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client.get(format!("{base}/api/beds/109")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let err: Value = resp.json().await.unwrap();
    assert!(err["detail"].as_str().unwrap().contains("1-108"));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn manual_hold_walk_in_and_conflicts() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // Manual hold on bed 7.
    let resp = client
        .post(format!("{base}/api/beds/7/hold"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    // Holding it again conflicts.
    let resp = client
        .post(format!("{base}/api/beds/7/hold"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Walk-in check-in on bed 8 (no reservation code).
    let resp = client
        .post(format!("{base}/api/beds/8/checkin"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reservation"]["status"], "checked_in");

    // Walk-in on the held bed conflicts: a hold is not occupancy.
    let resp = client
        .post(format!("{base}/api/beds/7/checkin"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Guest assignment on the occupied bed.
    let resp = client
        .post(format!("{base}/api/beds/8/assign"))
        .json(&json!({ "guest_id": "guest-31" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    // Releasing the manual hold returns bed 7 to available.
    let resp = client
        .post(format!("{base}/api/beds/7/release"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let bed: Value = client
        .get(format!("{base}/api/beds/7"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bed["status"], "available");

    // Releasing again, or releasing the occupied bed, conflicts.
    let resp = client
        .post(format!("{base}/api/beds/7/release"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let resp = client
        .post(format!("{base}/api/beds/8/release"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // A reservation-backed hold refuses release; cancel owns that path.
    let created: Value = client
        .post(format!("{base}/api/reservations/"))
        .json(&json!({ "caller_name": "Held Caller" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let held_bed = created["bed_id"].as_i64().unwrap();
    let resp = client
        .post(format!("{base}/api/beds/{held_bed}/release"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let err: Value = resp.json().await.unwrap();
    assert!(err["detail"].as_str().unwrap().contains("cancel"));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn chapel_weekend_is_rejected_and_weekday_slot_books_once() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let booking = |date: &str| {
        json!({
            "date": date,
            "time": "10:00",
            "group_name": "Grace Community Choir",
            "contact_name": "Ann Alvarez",
            "contact_phone": "555-0101"
        })
    };

    // 2026-03-07 is a Saturday.
    let resp = client
        .post(format!("{base}/api/chapel/"))
        .json(&booking("2026-03-07"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert!(err["detail"].as_str().unwrap().contains("weekdays"));

    // Weekday books fine.
    let resp = client
        .post(format!("{base}/api/chapel/"))
        .json(&booking("2026-03-04"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    // Same slot again is taken.
    let resp = client
        .post(format!("{base}/api/chapel/"))
        .json(&booking("2026-03-04"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn volunteer_registration_over_http() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/volunteers/"))
        .json(&json!({
            "name": "Dana Fields",
            "phone": "555-0147",
            "availability": ["weekends"],
            "interests": ["kitchen"]
        }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "pending");

    let resp = client
        .get(format!("{base}/api/volunteers/"))
        .send()
        .await
        .unwrap();
    let listed: Value = resp.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
