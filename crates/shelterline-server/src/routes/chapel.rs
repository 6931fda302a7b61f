use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use time::macros::format_description;
use time::Date;

use shelterline_api::ApiError;
use shelterline_core::ChapelBooking;
use shelterline_storage::NewChapelBooking;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChapelCreateRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, one of the configured slots
    pub time: String,
    pub group_name: String,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `GET /api/chapel/` — all bookings in (date, time) order.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ChapelBooking>>, ApiError> {
    Ok(Json(state.chapel.list().await?))
}

/// `POST /api/chapel/`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ChapelCreateRequest>,
) -> Result<Json<ChapelBooking>, ApiError> {
    let format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(&body.date, format)
        .map_err(|_| ApiError::bad_request("Invalid date format. Use YYYY-MM-DD"))?;

    let booked = state
        .chapel
        .schedule(NewChapelBooking {
            date,
            time: body.time,
            group_name: body.group_name,
            contact_name: body.contact_name,
            contact_phone: body.contact_phone,
            contact_email: body.contact_email,
            notes: body.notes,
        })
        .await?;
    Ok(Json(booked))
}
