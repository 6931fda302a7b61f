use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use shelterline_api::{ApiError, ReservationView};
use shelterline_core::{BedId, ConfirmationCode};
use shelterline_engine::BedSummary;
use shelterline_storage::BedRow;

use crate::server::AppState;

fn parse_bed_id(id: i64) -> Result<BedId, ApiError> {
    BedId::new(id).map_err(|_| ApiError::not_found("Bed not found. Valid beds: 1-108"))
}

/// `GET /api/beds/` — status counts; the three always sum to 108.
pub async fn summary(State(state): State<AppState>) -> Result<Json<BedSummary>, ApiError> {
    Ok(Json(state.reservations.summary().await?))
}

/// `GET /api/beds/list` — every bed with its status, in id order.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<BedRow>>, ApiError> {
    Ok(Json(state.reservations.bed_list().await?))
}

/// `GET /api/beds/available` — count plus a display message.
pub async fn available(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let summary = state.reservations.summary().await?;
    let message = if summary.available > 0 {
        format!("{} beds available", summary.available)
    } else {
        "No beds available at this time".to_string()
    };
    Ok(Json(json!({
        "available": summary.available,
        "message": message,
    })))
}

/// `GET /api/beds/{id}`
pub async fn get_bed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BedRow>, ApiError> {
    let bed_id = parse_bed_id(id)?;
    let status = state.reservations.bed_status(bed_id).await?;
    Ok(Json(BedRow { bed_id, status }))
}

/// `POST /api/beds/{id}/hold` — manual staff hold, no shadow reservation.
pub async fn hold(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let bed_id = parse_bed_id(id)?;
    state.reservations.hold(bed_id).await?;
    Ok(Json(json!({ "bed_id": bed_id, "status": "held" })))
}

/// `POST /api/beds/{id}/release` — undo a manual hold. A bed held by an
/// active reservation is refused; cancel the reservation instead.
pub async fn release(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let bed_id = parse_bed_id(id)?;
    state.reservations.release(bed_id).await?;
    Ok(Json(json!({ "bed_id": bed_id, "status": "available" })))
}

#[derive(Debug, Deserialize)]
pub struct CheckInParams {
    pub reservation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub status: &'static str,
    pub bed_id: BedId,
    pub reservation: ReservationView,
}

/// `POST /api/beds/{id}/checkin?reservation_id=` — consume a reservation,
/// or walk a guest in directly when no code is given.
pub async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<CheckInParams>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let bed_id = parse_bed_id(id)?;
    let code = params
        .reservation_id
        .as_deref()
        .map(|raw| {
            raw.parse::<ConfirmationCode>()
                .map_err(|e| ApiError::bad_request(e.to_string()))
        })
        .transpose()?;

    let outcome = state.reservations.check_in(bed_id, code.as_ref()).await?;
    Ok(Json(CheckInResponse {
        status: "checked_in",
        bed_id,
        reservation: outcome.reservation().clone().into(),
    }))
}

/// `POST /api/beds/{id}/checkout`
pub async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let bed_id = parse_bed_id(id)?;
    state.reservations.check_out(bed_id).await?;
    Ok(Json(json!({ "bed_id": bed_id, "status": "available" })))
}

#[derive(Debug, Deserialize)]
pub struct AssignGuestRequest {
    pub guest_id: String,
}

/// `POST /api/beds/{id}/assign` — attach a guest record to a bed.
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AssignGuestRequest>,
) -> Result<Json<Value>, ApiError> {
    let bed_id = parse_bed_id(id)?;
    if body.guest_id.trim().is_empty() {
        return Err(ApiError::bad_request("guest_id is required"));
    }
    // Confirm the bed exists before attaching anything to it.
    state.reservations.bed_status(bed_id).await?;
    state
        .guests
        .assign_guest(bed_id, body.guest_id.clone())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(json!({ "bed_id": bed_id, "guest_id": body.guest_id })))
}
