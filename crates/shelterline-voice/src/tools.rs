use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use time::Date;
use tracing::warn;

use shelterline_core::{ChapelBooking, Language, Reservation, Volunteer};
use shelterline_engine::{
    BedSummary, ChapelService, EngineError, ReservationService, VolunteerService,
};
use shelterline_engine::AllocationRequest;
use shelterline_storage::{NewChapelBooking, NewVolunteer};

use crate::error::ToolError;

/// Deadline and retry policy for tool calls. One policy for every tool,
/// honored uniformly by the router.
#[derive(Debug, Clone, Copy)]
pub struct ToolRouterConfig {
    pub call_deadline: Duration,
    /// Additional attempts after a timeout before the session degrades.
    pub retry_max: u32,
}

impl Default for ToolRouterConfig {
    fn default() -> Self {
        Self {
            call_deadline: Duration::from_secs(10),
            retry_max: 1,
        }
    }
}

/// The closed set of operations the call session may commit through.
///
/// Validation happens inside the tool (or the engine service underneath
/// it), never trusted from the session. Every call carries the configured
/// deadline; a timed-out call reports `ToolError::Timeout` and the session
/// decides whether to retry.
pub struct ToolRouter {
    reservations: Arc<ReservationService>,
    chapel: Arc<ChapelService>,
    volunteers: Arc<VolunteerService>,
    config: ToolRouterConfig,
}

impl ToolRouter {
    pub fn new(
        reservations: Arc<ReservationService>,
        chapel: Arc<ChapelService>,
        volunteers: Arc<VolunteerService>,
        config: ToolRouterConfig,
    ) -> Self {
        Self {
            reservations,
            chapel,
            volunteers,
            config,
        }
    }

    pub fn retry_max(&self) -> u32 {
        self.config.retry_max
    }

    /// Count of `available` beds.
    pub async fn check_availability(&self) -> Result<BedSummary, ToolError> {
        self.with_deadline(self.reservations.summary()).await
    }

    /// Reserve a bed for an assessed caller.
    pub async fn reserve_bed(
        &self,
        caller_name: &str,
        situation: &str,
        needs: &str,
        language: Language,
    ) -> Result<Reservation, ToolError> {
        let caller_name = caller_name.trim();
        if caller_name.is_empty() {
            return Err(ToolError::Engine(EngineError::validation(
                "caller name is required",
            )));
        }
        let request = AllocationRequest {
            caller_name: caller_name.to_string(),
            situation: situation.trim().to_string(),
            needs: needs.trim().to_string(),
            language,
            caller_ref: None,
        };
        self.with_deadline(self.reservations.create(request)).await
    }

    /// Book a chapel slot. Weekday/time/conflict validation is the chapel
    /// service's.
    pub async fn schedule_chapel_service(
        &self,
        date: Date,
        slot: &str,
        group_name: &str,
        contact_name: &str,
        contact_phone: &str,
    ) -> Result<ChapelBooking, ToolError> {
        let booking = NewChapelBooking {
            date,
            time: slot.trim().to_string(),
            group_name: group_name.trim().to_string(),
            contact_name: contact_name.trim().to_string(),
            contact_phone: contact_phone.trim().to_string(),
            contact_email: None,
            notes: None,
        };
        self.with_deadline(self.chapel.schedule(booking)).await
    }

    /// Register a volunteer.
    pub async fn register_volunteer(
        &self,
        name: &str,
        phone: &str,
        email: Option<&str>,
        availability: Vec<String>,
        interests: Vec<String>,
    ) -> Result<Volunteer, ToolError> {
        let volunteer = NewVolunteer {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            email: email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            availability,
            interests,
        };
        self.with_deadline(self.volunteers.register(volunteer)).await
    }

    /// Run one engine call under the per-call deadline.
    async fn with_deadline<T, F>(&self, call: F) -> Result<T, ToolError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        match tokio::time::timeout(self.config.call_deadline, call).await {
            Ok(result) => result.map_err(ToolError::Engine),
            Err(_) => {
                warn!(deadline_ms = self.config.call_deadline.as_millis() as u64, "tool call timed out");
                Err(ToolError::Timeout)
            }
        }
    }
}
