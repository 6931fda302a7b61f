use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use shelterline_core::TOTAL_BEDS;
use shelterline_voice::CrisisLexicon;

/// Application configuration, deserialized from an optional JSON file
/// (`SHELTERLINE_CONFIG`) with environment overrides for the common knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub shelter: ShelterConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Token gating the staff WebSocket. Unset means open (development).
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelterConfig {
    /// Fixed at 108; startup fails on anything else. Present so the
    /// invariant is visible (and auditable) in deployed configuration.
    #[serde(default = "default_total_beds")]
    pub total_beds: u16,
    #[serde(default = "default_hold_minutes")]
    pub hold_duration_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_tick_secs")]
    pub expiration_tick_secs: u64,
    #[serde(default = "default_retry_max")]
    pub allocation_retry_max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_idle_secs")]
    pub idle_session_timeout_secs: u64,
    #[serde(default = "default_deadline_secs")]
    pub tool_call_deadline_secs: u64,
    /// Closed multilingual self-harm phrase list. Replaces the compiled-in
    /// default wholesale when set; additions require redeploy.
    #[serde(default)]
    pub crisis_keywords: Option<CrisisLexicon>,
    #[serde(default = "default_chapel_slots")]
    pub chapel_time_slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_queue_bound")]
    pub subscriber_queue_bound: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_total_beds() -> u16 {
    TOTAL_BEDS
}
fn default_hold_minutes() -> u64 {
    180
}
fn default_tick_secs() -> u64 {
    30
}
fn default_retry_max() -> u32 {
    8
}
fn default_idle_secs() -> u64 {
    20
}
fn default_deadline_secs() -> u64 {
    10
}
fn default_chapel_slots() -> Vec<String> {
    vec!["10:00".to_string(), "13:00".to_string(), "19:00".to_string()]
}
fn default_queue_bound() -> usize {
    256
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
        }
    }
}

impl Default for ShelterConfig {
    fn default() -> Self {
        Self {
            total_beds: default_total_beds(),
            hold_duration_minutes: default_hold_minutes(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expiration_tick_secs: default_tick_secs(),
            allocation_retry_max: default_retry_max(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            idle_session_timeout_secs: default_idle_secs(),
            tool_call_deadline_secs: default_deadline_secs(),
            crisis_keywords: None,
            chapel_time_slots: default_chapel_slots(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_bound: default_queue_bound(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from the `SHELTERLINE_CONFIG` JSON file if present, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, String> {
        let mut config = match std::env::var("SHELTERLINE_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| format!("read config {path}: {e}"))?;
                serde_json::from_str(&raw).map_err(|e| format!("parse config {path}: {e}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(host) = std::env::var("SHELTERLINE_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("SHELTERLINE_PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| format!("SHELTERLINE_PORT: {e}"))?;
        }
        if let Ok(token) = std::env::var("SHELTERLINE_API_TOKEN") {
            config.server.api_token = Some(token);
        }
        if let Ok(level) = std::env::var("SHELTERLINE_LOG") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Fatal at startup on violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.shelter.total_beds != TOTAL_BEDS {
            return Err(format!(
                "shelter.total_beds is fixed at {TOTAL_BEDS}, got {}",
                self.shelter.total_beds
            ));
        }
        if self.shelter.hold_duration_minutes == 0 {
            return Err("shelter.hold_duration_minutes must be > 0".into());
        }
        if self.engine.expiration_tick_secs == 0 || self.engine.expiration_tick_secs > 60 {
            return Err("engine.expiration_tick_secs must be in 1..=60".into());
        }
        if self.engine.allocation_retry_max == 0 {
            return Err("engine.allocation_retry_max must be > 0".into());
        }
        if self.voice.tool_call_deadline_secs == 0 {
            return Err("voice.tool_call_deadline_secs must be > 0".into());
        }
        if self.voice.idle_session_timeout_secs == 0 {
            return Err("voice.idle_session_timeout_secs must be > 0".into());
        }
        if self.voice.chapel_time_slots.is_empty() {
            return Err("voice.chapel_time_slots must not be empty".into());
        }
        let level = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&level.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn hold_duration(&self) -> time::Duration {
        time::Duration::minutes(self.shelter.hold_duration_minutes as i64)
    }

    pub fn expiration_tick(&self) -> Duration {
        Duration::from_secs(self.engine.expiration_tick_secs)
    }

    pub fn tool_call_deadline(&self) -> Duration {
        Duration::from_secs(self.voice.tool_call_deadline_secs)
    }

    pub fn idle_session_timeout(&self) -> Duration {
        Duration::from_secs(self.voice.idle_session_timeout_secs)
    }
}
