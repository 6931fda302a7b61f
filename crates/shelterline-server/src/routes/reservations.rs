use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use shelterline_api::{ApiError, ReservationView};
use shelterline_core::{now_utc, ConfirmationCode, Language};
use shelterline_engine::AllocationRequest;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub caller_name: String,
    #[serde(default)]
    pub situation: Option<String>,
    #[serde(default)]
    pub needs: Option<String>,
    /// Language code: en, es, pt, fr. Defaults to en.
    #[serde(default)]
    pub language: Option<String>,
    /// Opaque hashed caller reference for the duplicate guard. Never a raw
    /// phone number.
    #[serde(default)]
    pub caller_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationListResponse {
    pub reservations: Vec<ReservationView>,
}

fn parse_code(raw: &str) -> Result<ConfirmationCode, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("Reservation not found: {raw}")))
}

/// `GET /api/reservations/` — active reservations with remaining time
/// computed at read time.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ReservationListResponse>, ApiError> {
    let now = now_utc();
    let reservations = state
        .reservations
        .list_active()
        .await?
        .into_iter()
        .map(|r| ReservationView::at(r, now))
        .collect();
    Ok(Json(ReservationListResponse { reservations }))
}

/// `POST /api/reservations/`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateReservationRequest>,
) -> Result<Json<ReservationView>, ApiError> {
    if body.caller_name.trim().is_empty() {
        return Err(ApiError::bad_request("caller_name is required"));
    }
    let language = match body.language.as_deref() {
        Some(raw) => raw
            .parse::<Language>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => Language::English,
    };

    let reservation = state
        .reservations
        .create(AllocationRequest {
            caller_name: body.caller_name.trim().to_string(),
            situation: body.situation.unwrap_or_default(),
            needs: body.needs.unwrap_or_default(),
            language,
            caller_ref: body.caller_ref,
        })
        .await?;
    Ok(Json(reservation.into()))
}

/// `GET /api/reservations/{code}`
pub async fn get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ReservationView>, ApiError> {
    let code = parse_code(&code)?;
    let reservation = state
        .reservations
        .get(&code)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Reservation not found: {code}")))?;
    Ok(Json(reservation.into()))
}

/// `POST /api/reservations/{code}/cancel` — idempotent.
pub async fn cancel(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ReservationView>, ApiError> {
    let code = parse_code(&code)?;
    let cancelled = state.reservations.cancel(&code).await?;
    Ok(Json(cancelled.into()))
}
