use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use shelterline_api::ApiError;
use shelterline_core::Volunteer;
use shelterline_storage::NewVolunteer;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct VolunteerCreateRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// `GET /api/volunteers/` — all volunteers in name order.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Volunteer>>, ApiError> {
    Ok(Json(state.volunteers.list().await?))
}

/// `POST /api/volunteers/`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<VolunteerCreateRequest>,
) -> Result<Json<Volunteer>, ApiError> {
    let registered = state
        .volunteers
        .register(NewVolunteer {
            name: body.name,
            phone: body.phone,
            email: body.email,
            availability: body.availability,
            interests: body.interests,
        })
        .await?;
    Ok(Json(registered))
}
