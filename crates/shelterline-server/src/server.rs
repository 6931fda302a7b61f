use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use shelterline_core::EventBroadcaster;
use shelterline_db_memory::InMemoryShelterStore;
use shelterline_engine::{
    ChapelService, ExpirationScheduler, ReservationService, VolunteerService,
};
use shelterline_storage::GuestDirectory;
use shelterline_voice::{CrisisLexicon, IntentClassifier, ToolRouter, ToolRouterConfig};

use crate::config::AppConfig;
use crate::{handlers, routes, voice_ws, ws};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationService>,
    pub chapel: Arc<ChapelService>,
    pub volunteers: Arc<VolunteerService>,
    pub guests: Arc<dyn GuestDirectory>,
    pub events: EventBroadcaster,
    /// Staff chat relay; raw JSON text fan-out.
    pub chat: broadcast::Sender<String>,
    pub classifier: IntentClassifier,
    pub tools: Arc<ToolRouter>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(InMemoryShelterStore::new());
        let events = EventBroadcaster::new();

        let reservations = Arc::new(ReservationService::new(
            store.clone(),
            store.clone(),
            config.hold_duration(),
            config.engine.allocation_retry_max,
            events.clone(),
        ));
        let chapel = Arc::new(ChapelService::new(
            store.clone(),
            config.voice.chapel_time_slots.clone(),
        ));
        let volunteers = Arc::new(VolunteerService::new(store.clone()));
        let tools = Arc::new(ToolRouter::new(
            reservations.clone(),
            chapel.clone(),
            volunteers.clone(),
            ToolRouterConfig {
                call_deadline: config.tool_call_deadline(),
                retry_max: 1,
            },
        ));
        let classifier = IntentClassifier::new(
            config
                .voice
                .crisis_keywords
                .clone()
                .unwrap_or_else(CrisisLexicon::default),
        );
        let (chat, _) = broadcast::channel(1024);

        Self {
            reservations,
            chapel,
            volunteers,
            guests: store,
            events,
            chat,
            classifier,
            tools,
            config,
        }
    }
}

/// Assemble the router over a prepared state. Kept separate from binding
/// so integration tests can serve it on an ephemeral port.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/api/beds/", get(routes::beds::summary))
        .route("/api/beds/list", get(routes::beds::list))
        .route("/api/beds/available", get(routes::beds::available))
        .route("/api/beds/{id}", get(routes::beds::get_bed))
        .route("/api/beds/{id}/hold", post(routes::beds::hold))
        .route("/api/beds/{id}/release", post(routes::beds::release))
        .route("/api/beds/{id}/checkin", post(routes::beds::check_in))
        .route("/api/beds/{id}/checkout", post(routes::beds::check_out))
        .route("/api/beds/{id}/assign", post(routes::beds::assign))
        .route(
            "/api/reservations/",
            get(routes::reservations::list).post(routes::reservations::create),
        )
        .route("/api/reservations/{code}", get(routes::reservations::get))
        .route(
            "/api/reservations/{code}/cancel",
            post(routes::reservations::cancel),
        )
        .route(
            "/api/chapel/",
            get(routes::chapel::list).post(routes::chapel::create),
        )
        .route(
            "/api/volunteers/",
            get(routes::volunteers::list).post(routes::volunteers::create),
        )
        .route("/api/chat/ws", get(ws::chat_ws))
        .route("/api/voice/ws", get(voice_ws::voice_ws))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The assembled server: seeded state, background sweep, bound listener.
pub struct ShelterServer {
    state: AppState,
}

impl ShelterServer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::from_config(config),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Seed beds, verify invariants, start the expiration sweep, and serve
    /// until ctrl-c. Invariant or bind failures are fatal before the
    /// listener accepts anything.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let state = self.state;
        state.reservations.initialize().await?;

        let scheduler = ExpirationScheduler::new(
            state.reservations.clone(),
            state.config.expiration_tick(),
        );
        tokio::spawn(scheduler.run());

        let addr = state.config.addr();
        let app = build_app(state);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "shelterline server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown signal received");
            })
            .await?;
        Ok(())
    }
}
