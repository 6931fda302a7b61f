use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use shelterline_core::{EventBroadcaster, Language, ReservationStatus};
use shelterline_db_memory::InMemoryShelterStore;
use shelterline_engine::{ChapelService, ReservationService, VolunteerService};
use shelterline_voice::{
    run_session, CallSession, IntentClassifier, SessionConfig, SessionState, ToolRouter,
    ToolRouterConfig,
};

struct Fixture {
    reservations: Arc<ReservationService>,
    chapel: Arc<ChapelService>,
    tools: Arc<ToolRouter>,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryShelterStore::new());
    let reservations = Arc::new(ReservationService::new(
        store.clone(),
        store.clone(),
        time::Duration::hours(3),
        8,
        EventBroadcaster::new(),
    ));
    reservations.initialize().await.unwrap();

    let slots = vec!["10:00".to_string(), "13:00".to_string(), "19:00".to_string()];
    let chapel = Arc::new(ChapelService::new(store.clone(), slots));
    let volunteers = Arc::new(VolunteerService::new(store));
    let tools = Arc::new(ToolRouter::new(
        reservations.clone(),
        chapel.clone(),
        volunteers,
        ToolRouterConfig::default(),
    ));
    Fixture {
        reservations,
        chapel,
        tools,
    }
}

fn session(fixture: &Fixture) -> CallSession {
    CallSession::with_generated_token(
        IntentClassifier::default(),
        fixture.tools.clone(),
        vec!["10:00".into(), "13:00".into(), "19:00".into()],
    )
}

#[tokio::test]
async fn s6_crisis_phrase_routes_to_spanish_hotline_without_reservation() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    let reply = call.handle_utterance("Quiero matarme.").await.unwrap();
    assert!(reply.speech.contains("988"), "hotline number missing");
    assert!(
        reply.speech.contains("seguridad"),
        "hotline not delivered in Spanish: {}",
        reply.speech
    );
    assert!(!reply.end_call);
    assert_eq!(*call.state(), SessionState::CrisisFlow);
    assert!(fixture.reservations.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn s6_shelter_need_in_spanish_routes_to_bed_flow_not_crisis() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    let reply = call
        .handle_utterance("Necesito una cama, estoy sin hogar")
        .await
        .unwrap();
    assert_ne!(*call.state(), SessionState::CrisisFlow);
    // Availability offer, spoken in Spanish.
    assert!(reply.speech.contains("camas"), "not Spanish: {}", reply.speech);
    assert!(reply.speech.contains("108"));
}

#[tokio::test]
async fn bed_flow_commits_exactly_one_reservation() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    call.handle_utterance("I need a bed for tonight").await.unwrap();
    call.handle_utterance("yes please").await.unwrap();
    call.handle_utterance("John Smith").await.unwrap();
    call.handle_utterance("I was evicted last week").await.unwrap();
    call.handle_utterance("none").await.unwrap();
    let confirmation = call.handle_utterance("yes").await.unwrap();

    let reservation = call.committed_reservation().cloned().expect("committed");
    assert_eq!(reservation.caller_name, "John Smith");
    assert_eq!(reservation.status, ReservationStatus::Active);
    assert!(confirmation.speech.contains(reservation.code.as_str()));
    assert!(confirmation.speech.contains("bed 1"));

    // A second ask re-reads the confirmation instead of re-reserving.
    let again = call.handle_utterance("I want to reserve another bed").await.unwrap();
    assert!(again.speech.contains(reservation.code.as_str()));
    assert_eq!(fixture.reservations.list_active().await.unwrap().len(), 1);

    let farewell = call.handle_utterance("goodbye").await.unwrap();
    assert!(farewell.end_call);
}

#[tokio::test]
async fn bed_flow_in_spanish_speaks_spanish_throughout() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    let offer = call
        .handle_utterance("Hola, necesito una cama por favor")
        .await
        .unwrap();
    assert_eq!(call.language(), Language::Spanish);
    assert!(offer.speech.contains("camas"));

    call.handle_utterance("sí").await.unwrap();
    call.handle_utterance("Carlos Rivera").await.unwrap();
    call.handle_utterance("Perdí mi vivienda").await.unwrap();
    call.handle_utterance("ninguna").await.unwrap();
    let confirmation = call.handle_utterance("sí").await.unwrap();

    let reservation = call.committed_reservation().expect("committed");
    assert_eq!(reservation.language, Language::Spanish);
    assert!(
        confirmation.speech.contains("código de confirmación"),
        "confirmation not in Spanish: {}",
        confirmation.speech
    );
}

#[tokio::test]
async fn chapel_flow_rejects_weekend_and_reasks_date() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    call.handle_utterance("We'd like to lead a chapel service")
        .await
        .unwrap();
    // 2026-03-07 is a Saturday.
    call.handle_utterance("2026-03-07").await.unwrap();
    call.handle_utterance("10:00").await.unwrap();
    call.handle_utterance("Grace Community Choir").await.unwrap();
    call.handle_utterance("Ann Alvarez").await.unwrap();
    let rejected = call.handle_utterance("555-0101").await.unwrap();
    assert!(rejected.speech.contains("weekdays only"));
    assert!(fixture.chapel.list().await.unwrap().is_empty());

    // Retry with a Wednesday.
    call.handle_utterance("2026-03-04").await.unwrap();
    call.handle_utterance("10:00").await.unwrap();
    call.handle_utterance("Grace Community Choir").await.unwrap();
    call.handle_utterance("Ann Alvarez").await.unwrap();
    let confirmed = call.handle_utterance("555-0101").await.unwrap();
    assert!(confirmed.speech.contains("2026-03-04"));
    assert_eq!(fixture.chapel.list().await.unwrap().len(), 1);

    // Exactly-once: asking again re-reads the booking.
    let again = call.handle_utterance("Can we schedule a chapel service?").await.unwrap();
    assert!(again.speech.contains("2026-03-04"));
    assert_eq!(fixture.chapel.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn volunteer_flow_registers_once() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    call.handle_utterance("I'd like to volunteer").await.unwrap();
    call.handle_utterance("Dana Fields").await.unwrap();
    call.handle_utterance("555-0147").await.unwrap();
    call.handle_utterance("weekends and tuesday evenings").await.unwrap();
    let confirmed = call.handle_utterance("kitchen, chapel").await.unwrap();
    assert!(confirmed.speech.contains("Dana Fields"));

    let again = call.handle_utterance("sign me up to volunteer").await.unwrap();
    assert!(again.speech.contains("Dana Fields"));
}

#[tokio::test]
async fn farewell_ends_the_call_from_mid_flow() {
    let fixture = fixture().await;
    let mut call = session(&fixture);
    call.greeting();

    call.handle_utterance("I need a bed").await.unwrap();
    let reply = call.handle_utterance("Actually that's all, goodbye").await.unwrap();
    assert!(reply.end_call);
    assert_eq!(*call.state(), SessionState::Ended);
    assert!(call.handle_utterance("hello?").await.is_err());
    assert!(fixture.reservations.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn no_capacity_is_reported_without_side_effect() {
    let fixture = fixture().await;
    for i in 0..108 {
        fixture
            .reservations
            .create(shelterline_engine::AllocationRequest {
                caller_name: format!("Caller {i}"),
                situation: String::new(),
                needs: String::new(),
                language: Language::English,
                caller_ref: None,
            })
            .await
            .unwrap();
    }

    let mut call = session(&fixture);
    call.greeting();
    let reply = call.handle_utterance("Do you have a bed?").await.unwrap();
    assert!(reply.speech.contains("all of our beds are taken"));
    assert_eq!(fixture.reservations.list_active().await.unwrap().len(), 108);
}

#[tokio::test]
async fn driver_hangs_up_on_idle_timeout() {
    let fixture = fixture().await;
    let call = session(&fixture);
    let (utterance_tx, utterance_rx) = mpsc::channel(8);
    let (reply_tx, mut reply_rx) = mpsc::channel(8);

    let driver = tokio::spawn(run_session(
        call,
        utterance_rx,
        reply_tx,
        SessionConfig {
            idle_timeout: Duration::from_millis(50),
        },
    ));

    let greeting = reply_rx.recv().await.unwrap();
    assert!(!greeting.end_call);

    // Say nothing; the idle deadline should close the call politely.
    let farewell = reply_rx.recv().await.unwrap();
    assert!(farewell.end_call);
    driver.await.unwrap();
    drop(utterance_tx);
}
