use std::sync::Arc;
use std::time::Duration;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shelterline_core::{ChapelBooking, Language, Reservation, Volunteer};
use shelterline_engine::EngineError;

use crate::error::{ToolError, VoiceError};
use crate::intent::{detect_language, Intent, IntentClassifier};
use crate::phrases;
use crate::tools::ToolRouter;

/// Session tuning knobs the server wires from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Hang up after this long without a caller utterance.
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(20),
        }
    }
}

/// Where the call currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Greeting,
    ClassifyIntent,
    BedFlow(BedStage),
    ChapelFlow(ChapelStage),
    VolunteerFlow(VolunteerStage),
    CrisisFlow,
    Farewell,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedStage {
    OfferReserve,
    GatherName,
    GatherSituation,
    GatherNeeds,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapelStage {
    GatherDate,
    GatherTime,
    GatherGroup,
    GatherContactName,
    GatherContactPhone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolunteerStage {
    GatherName,
    GatherPhone,
    GatherAvailability,
    GatherInterests,
}

/// What the speech pipeline should say next.
#[derive(Debug, Clone)]
pub struct SessionReply {
    pub speech: String,
    pub end_call: bool,
}

impl SessionReply {
    fn speak(speech: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            end_call: false,
        }
    }

    fn hangup(speech: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            end_call: true,
        }
    }
}

/// Committed side effects, the session's exactly-once latch. Once a flow's
/// tool has succeeded, later utterances that would re-issue it get the
/// original confirmation instead.
#[derive(Debug, Default)]
struct Committed {
    reservation: Option<Reservation>,
    chapel: Option<ChapelBooking>,
    volunteer: Option<Volunteer>,
}

#[derive(Debug, Default)]
struct BedSlots {
    name: Option<String>,
    situation: Option<String>,
    needs: Option<String>,
}

#[derive(Debug, Default)]
struct ChapelSlots {
    date: Option<Date>,
    time: Option<String>,
    group: Option<String>,
    contact_name: Option<String>,
}

#[derive(Debug, Default)]
struct VolunteerSlots {
    name: Option<String>,
    phone: Option<String>,
    availability: Vec<String>,
}

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// One phone call: a state machine fed transcribed utterances, producing
/// speech and driving the engine through the tool router.
///
/// All intermediate state lives here in memory and dies with the call;
/// only committed tool effects persist. The language detected from the
/// first substantive utterance sticks for the rest of the call and
/// annotates tool calls and farewells.
pub struct CallSession {
    token: String,
    state: SessionState,
    language: Option<Language>,
    bed: BedSlots,
    chapel: ChapelSlots,
    volunteer: VolunteerSlots,
    committed: Committed,
    classifier: IntentClassifier,
    tools: Arc<ToolRouter>,
    chapel_slots: Vec<String>,
}

impl CallSession {
    /// `token` is the per-call identity from the telephony bridge; tests
    /// and local tools can use [`CallSession::with_generated_token`].
    pub fn new(
        token: impl Into<String>,
        classifier: IntentClassifier,
        tools: Arc<ToolRouter>,
        chapel_slots: Vec<String>,
    ) -> Self {
        Self {
            token: token.into(),
            state: SessionState::Greeting,
            language: None,
            bed: BedSlots::default(),
            chapel: ChapelSlots::default(),
            volunteer: VolunteerSlots::default(),
            committed: Committed::default(),
            classifier,
            tools,
            chapel_slots,
        }
    }

    pub fn with_generated_token(
        classifier: IntentClassifier,
        tools: Arc<ToolRouter>,
        chapel_slots: Vec<String>,
    ) -> Self {
        Self::new(Uuid::new_v4().to_string(), classifier, tools, chapel_slots)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Language in effect for phrasing: detected, defaulting to English.
    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn committed_reservation(&self) -> Option<&Reservation> {
        self.committed.reservation.as_ref()
    }

    /// Opening line, spoken at call setup before the caller says anything.
    pub fn greeting(&mut self) -> SessionReply {
        if self.state == SessionState::Greeting {
            self.state = SessionState::ClassifyIntent;
        }
        SessionReply::speak(phrases::greeting(self.language()))
    }

    /// Feed one transcribed utterance and get the next line to speak.
    pub async fn handle_utterance(&mut self, utterance: &str) -> Result<SessionReply, VoiceError> {
        if self.state == SessionState::Ended {
            return Err(VoiceError::SessionEnded);
        }

        let trimmed = utterance.trim();
        let lower = trimmed.to_lowercase();

        // First substantive utterance fixes the call language. Switching
        // mid-call is permitted but not sought out.
        if self.language.is_none() && !trimmed.is_empty() {
            let detected = detect_language(trimmed);
            debug!(token = %self.token, language = %detected, "call language detected");
            self.language = Some(detected);
        }

        // Crisis phrases preempt every state. The phrase's own language
        // wins so the hotline is delivered in the language of distress.
        if let Some(crisis_language) = self.classifier.crisis_language(trimmed) {
            self.language = Some(crisis_language);
            self.state = SessionState::CrisisFlow;
            info!(token = %self.token, "crisis phrase detected, delivering hotline");
            return Ok(SessionReply::speak(phrases::crisis_hotline(crisis_language)));
        }

        // Explicit farewells end the call from any state.
        if phrases::is_farewell(&lower) {
            self.state = SessionState::Ended;
            return Ok(SessionReply::hangup(phrases::farewell(self.language())));
        }

        let state = self.state.clone();
        match state {
            SessionState::Greeting | SessionState::ClassifyIntent => {
                self.classify_and_branch(trimmed).await
            }
            SessionState::BedFlow(stage) => self.bed_flow(stage, trimmed, &lower).await,
            SessionState::ChapelFlow(stage) => self.chapel_flow(stage, trimmed).await,
            SessionState::VolunteerFlow(stage) => self.volunteer_flow(stage, trimmed).await,
            SessionState::CrisisFlow | SessionState::Farewell => {
                self.state = SessionState::Ended;
                Ok(SessionReply::hangup(phrases::farewell(self.language())))
            }
            SessionState::Ended => Err(VoiceError::SessionEnded),
        }
    }

    async fn classify_and_branch(&mut self, utterance: &str) -> Result<SessionReply, VoiceError> {
        self.state = SessionState::ClassifyIntent;
        let language = self.language();
        match self.classifier.classify(utterance) {
            Intent::BedInquiry => self.enter_bed_flow().await,
            Intent::Chapel => {
                if let Some(booked) = &self.committed.chapel {
                    let date = booked.date.format(DATE_FORMAT).unwrap_or_default();
                    return Ok(SessionReply::speak(phrases::chapel_confirmed(
                        &date,
                        &booked.time,
                    )));
                }
                self.state = SessionState::ChapelFlow(ChapelStage::GatherDate);
                Ok(SessionReply::speak(phrases::ask_chapel_date()))
            }
            Intent::Volunteer => {
                if let Some(volunteer) = &self.committed.volunteer {
                    return Ok(SessionReply::speak(phrases::volunteer_confirmed(
                        &volunteer.name,
                    )));
                }
                self.state = SessionState::VolunteerFlow(VolunteerStage::GatherName);
                Ok(SessionReply::speak(phrases::ask_volunteer_name()))
            }
            Intent::Donation => Ok(SessionReply::speak(phrases::donation_info(language))),
            Intent::Crisis => {
                // Unreachable in practice: preemption already handled it.
                self.state = SessionState::Farewell;
                Ok(SessionReply::speak(phrases::crisis_hotline(language)))
            }
            Intent::Other => Ok(SessionReply::speak(phrases::fallback(language))),
        }
    }

    async fn enter_bed_flow(&mut self) -> Result<SessionReply, VoiceError> {
        let language = self.language();
        if let Some(reservation) = &self.committed.reservation {
            return Ok(SessionReply::speak(phrases::already_reserved(
                language,
                &reservation.code,
                reservation.bed_id.get(),
            )));
        }

        match self.call_with_retry(|| self.tools.check_availability()).await {
            Ok(summary) if summary.available > 0 => {
                self.state = SessionState::BedFlow(BedStage::OfferReserve);
                Ok(SessionReply::speak(phrases::availability(
                    language,
                    summary.available,
                    summary.total,
                )))
            }
            Ok(_) => {
                self.state = SessionState::ClassifyIntent;
                Ok(SessionReply::speak(phrases::no_capacity(language)))
            }
            Err(err) => Ok(self.degrade(err)),
        }
    }

    async fn bed_flow(
        &mut self,
        stage: BedStage,
        utterance: &str,
        lower: &str,
    ) -> Result<SessionReply, VoiceError> {
        let language = self.language();
        match stage {
            BedStage::OfferReserve => {
                if phrases::is_no(lower) {
                    self.state = SessionState::ClassifyIntent;
                    Ok(SessionReply::speak(phrases::fallback(language)))
                } else if phrases::is_yes(lower) {
                    self.state = SessionState::BedFlow(BedStage::GatherName);
                    Ok(SessionReply::speak(phrases::ask_name(language)))
                } else {
                    Ok(SessionReply::speak(phrases::confirm_reservation(
                        language, "friend",
                    )))
                }
            }
            BedStage::GatherName => {
                if utterance.is_empty() {
                    return Ok(SessionReply::speak(phrases::ask_name(language)));
                }
                self.bed.name = Some(utterance.to_string());
                self.state = SessionState::BedFlow(BedStage::GatherSituation);
                Ok(SessionReply::speak(phrases::ask_situation(language)))
            }
            BedStage::GatherSituation => {
                if utterance.is_empty() {
                    return Ok(SessionReply::speak(phrases::ask_situation(language)));
                }
                self.bed.situation = Some(utterance.to_string());
                self.state = SessionState::BedFlow(BedStage::GatherNeeds);
                Ok(SessionReply::speak(phrases::ask_needs(language)))
            }
            BedStage::GatherNeeds => {
                self.bed.needs = Some(utterance.to_string());
                self.state = SessionState::BedFlow(BedStage::Confirm);
                let name = self.bed.name.clone().unwrap_or_else(|| "friend".into());
                Ok(SessionReply::speak(phrases::confirm_reservation(
                    language, &name,
                )))
            }
            BedStage::Confirm => {
                if phrases::is_no(lower) {
                    self.state = SessionState::ClassifyIntent;
                    return Ok(SessionReply::speak(phrases::fallback(language)));
                }
                if !phrases::is_yes(lower) {
                    let name = self.bed.name.clone().unwrap_or_else(|| "friend".into());
                    return Ok(SessionReply::speak(phrases::confirm_reservation(
                        language, &name,
                    )));
                }
                self.allocate_bed().await
            }
        }
    }

    /// The ALLOCATE step: exactly-once per session.
    async fn allocate_bed(&mut self) -> Result<SessionReply, VoiceError> {
        let language = self.language();
        if let Some(reservation) = &self.committed.reservation {
            return Ok(SessionReply::speak(phrases::already_reserved(
                language,
                &reservation.code,
                reservation.bed_id.get(),
            )));
        }

        let name = self.bed.name.clone().unwrap_or_default();
        let situation = self.bed.situation.clone().unwrap_or_default();
        let needs = self.bed.needs.clone().unwrap_or_default();

        let result = self
            .call_with_retry(|| self.tools.reserve_bed(&name, &situation, &needs, language))
            .await;

        match result {
            Ok(reservation) => {
                info!(
                    token = %self.token,
                    code = %reservation.code,
                    bed_id = %reservation.bed_id,
                    "reservation committed from call"
                );
                let reply = phrases::reservation_confirmed(
                    language,
                    &reservation.code,
                    reservation.bed_id.get(),
                );
                self.committed.reservation = Some(reservation);
                self.state = SessionState::ClassifyIntent;
                Ok(SessionReply::speak(reply))
            }
            Err(ToolError::Engine(EngineError::NoCapacity)) => {
                self.state = SessionState::ClassifyIntent;
                Ok(SessionReply::speak(phrases::no_capacity(language)))
            }
            Err(err) => Ok(self.degrade(err)),
        }
    }

    async fn chapel_flow(
        &mut self,
        stage: ChapelStage,
        utterance: &str,
    ) -> Result<SessionReply, VoiceError> {
        match stage {
            ChapelStage::GatherDate => {
                let Ok(date) = Date::parse(utterance, DATE_FORMAT) else {
                    return Ok(SessionReply::speak(phrases::chapel_bad_date()));
                };
                self.chapel.date = Some(date);
                self.state = SessionState::ChapelFlow(ChapelStage::GatherTime);
                Ok(SessionReply::speak(phrases::ask_chapel_time(
                    &self.chapel_slots,
                )))
            }
            ChapelStage::GatherTime => {
                self.chapel.time = Some(utterance.to_string());
                self.state = SessionState::ChapelFlow(ChapelStage::GatherGroup);
                Ok(SessionReply::speak(phrases::ask_chapel_group()))
            }
            ChapelStage::GatherGroup => {
                if utterance.is_empty() {
                    return Ok(SessionReply::speak(phrases::ask_chapel_group()));
                }
                self.chapel.group = Some(utterance.to_string());
                self.state = SessionState::ChapelFlow(ChapelStage::GatherContactName);
                Ok(SessionReply::speak(phrases::ask_chapel_contact_name()))
            }
            ChapelStage::GatherContactName => {
                if utterance.is_empty() {
                    return Ok(SessionReply::speak(phrases::ask_chapel_contact_name()));
                }
                self.chapel.contact_name = Some(utterance.to_string());
                self.state = SessionState::ChapelFlow(ChapelStage::GatherContactPhone);
                Ok(SessionReply::speak(phrases::ask_chapel_contact_phone()))
            }
            ChapelStage::GatherContactPhone => self.schedule_chapel(utterance).await,
        }
    }

    /// The SCHEDULE step: exactly-once per session.
    async fn schedule_chapel(&mut self, phone: &str) -> Result<SessionReply, VoiceError> {
        if let Some(booked) = &self.committed.chapel {
            let date = booked.date.format(DATE_FORMAT).unwrap_or_default();
            return Ok(SessionReply::speak(phrases::chapel_confirmed(
                &date,
                &booked.time,
            )));
        }

        let Some(date) = self.chapel.date else {
            self.state = SessionState::ChapelFlow(ChapelStage::GatherDate);
            return Ok(SessionReply::speak(phrases::ask_chapel_date()));
        };
        let slot = self.chapel.time.clone().unwrap_or_default();
        let group = self.chapel.group.clone().unwrap_or_default();
        let contact = self.chapel.contact_name.clone().unwrap_or_default();

        let result = self
            .call_with_retry(|| {
                self.tools
                    .schedule_chapel_service(date, &slot, &group, &contact, phone)
            })
            .await;

        match result {
            Ok(booked) => {
                info!(token = %self.token, id = booked.id, "chapel service committed from call");
                let date = booked.date.format(DATE_FORMAT).unwrap_or_default();
                let reply = phrases::chapel_confirmed(&date, &booked.time);
                self.committed.chapel = Some(booked);
                self.state = SessionState::ClassifyIntent;
                Ok(SessionReply::speak(reply))
            }
            Err(ToolError::Engine(EngineError::WeekendDisallowed)) => {
                self.chapel.date = None;
                self.state = SessionState::ChapelFlow(ChapelStage::GatherDate);
                Ok(SessionReply::speak(phrases::chapel_weekend()))
            }
            Err(ToolError::Engine(EngineError::InvalidTime(_))) => {
                self.chapel.time = None;
                self.state = SessionState::ChapelFlow(ChapelStage::GatherTime);
                Ok(SessionReply::speak(phrases::chapel_invalid_time(
                    &self.chapel_slots,
                )))
            }
            Err(ToolError::Engine(EngineError::SlotTaken)) => {
                self.chapel.date = None;
                self.chapel.time = None;
                self.state = SessionState::ChapelFlow(ChapelStage::GatherDate);
                Ok(SessionReply::speak(phrases::chapel_slot_taken()))
            }
            Err(err) => Ok(self.degrade(err)),
        }
    }

    async fn volunteer_flow(
        &mut self,
        stage: VolunteerStage,
        utterance: &str,
    ) -> Result<SessionReply, VoiceError> {
        match stage {
            VolunteerStage::GatherName => {
                if utterance.is_empty() {
                    return Ok(SessionReply::speak(phrases::ask_volunteer_name()));
                }
                self.volunteer.name = Some(utterance.to_string());
                self.state = SessionState::VolunteerFlow(VolunteerStage::GatherPhone);
                Ok(SessionReply::speak(phrases::ask_volunteer_phone()))
            }
            VolunteerStage::GatherPhone => {
                if utterance.is_empty() {
                    return Ok(SessionReply::speak(phrases::ask_volunteer_phone()));
                }
                self.volunteer.phone = Some(utterance.to_string());
                self.state = SessionState::VolunteerFlow(VolunteerStage::GatherAvailability);
                Ok(SessionReply::speak(phrases::ask_volunteer_availability()))
            }
            VolunteerStage::GatherAvailability => {
                self.volunteer.availability = split_list(utterance);
                self.state = SessionState::VolunteerFlow(VolunteerStage::GatherInterests);
                Ok(SessionReply::speak(phrases::ask_volunteer_interests()))
            }
            VolunteerStage::GatherInterests => self.register_volunteer(utterance).await,
        }
    }

    /// The REGISTER step: exactly-once per session.
    async fn register_volunteer(&mut self, interests: &str) -> Result<SessionReply, VoiceError> {
        if let Some(volunteer) = &self.committed.volunteer {
            return Ok(SessionReply::speak(phrases::volunteer_confirmed(
                &volunteer.name,
            )));
        }

        let name = self.volunteer.name.clone().unwrap_or_default();
        let phone = self.volunteer.phone.clone().unwrap_or_default();
        let availability = self.volunteer.availability.clone();
        let interests = split_list(interests);

        let result = self
            .call_with_retry(|| {
                self.tools.register_volunteer(
                    &name,
                    &phone,
                    None,
                    availability.clone(),
                    interests.clone(),
                )
            })
            .await;

        match result {
            Ok(volunteer) => {
                info!(token = %self.token, id = volunteer.id, "volunteer committed from call");
                let reply = phrases::volunteer_confirmed(&volunteer.name);
                self.committed.volunteer = Some(volunteer);
                self.state = SessionState::ClassifyIntent;
                Ok(SessionReply::speak(reply))
            }
            Err(err) => Ok(self.degrade(err)),
        }
    }

    /// Run a tool call; after a timeout, retry up to the router's cap.
    async fn call_with_retry<T, F, Fut>(&self, mut call: F) -> Result<T, ToolError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ToolError>>,
    {
        let mut attempts = 0;
        loop {
            match call().await {
                Err(ToolError::Timeout) if attempts < self.tools.retry_max() => {
                    attempts += 1;
                    warn!(token = %self.token, attempts, "tool timed out, retrying");
                }
                other => return other,
            }
        }
    }

    fn degrade(&mut self, err: ToolError) -> SessionReply {
        warn!(token = %self.token, error = %err, "tool failed, degrading");
        self.state = SessionState::ClassifyIntent;
        SessionReply::speak(phrases::degraded(self.language()))
    }
}

/// Split a spoken list like "weekends, tuesday evenings and kitchen" into
/// items on commas and "and".
fn split_list(utterance: &str) -> Vec<String> {
    utterance
        .split(',')
        .flat_map(|part| part.split(" and "))
        .flat_map(|part| part.split(" y "))
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
