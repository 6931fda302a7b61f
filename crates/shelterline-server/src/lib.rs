//! Shelterline HTTP server: staff API, dashboard notifier WebSocket, and
//! the voice-session endpoint, over the in-process engine.

mod config;
mod handlers;
mod routes;
mod server;
mod voice_ws;
mod ws;

pub use config::AppConfig;
pub use server::{build_app, AppState, ShelterServer};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
