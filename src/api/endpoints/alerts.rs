//! Alert endpoints: raise, scoped list, detail (with reverse-geocoded
//! address), status progression, and the responder action log.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alerts::{self, AlertDetail, NewAlert};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::models::{Alert, AlertResponse, AlertStatus, AlertType};

#[derive(Deserialize)]
pub struct CreateAlertRequest {
    pub alert_type: AlertType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// `POST /api/alerts` — raise an alert (civilian only).
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateAlertRequest>,
) -> Result<Json<Alert>, ApiError> {
    let new = NewAlert {
        alert_type: request.alert_type,
        latitude: request.latitude,
        longitude: request.longitude,
        description: request.description,
    };
    let conn = ctx.state.db()?;
    let alert = alerts::create_alert(&conn, &ctx.state.hub, &identity, &new)?;
    Ok(Json(alert))
}

/// `GET /api/alerts` — alerts visible to the caller, most recent first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let conn = ctx.state.db()?;
    let listed = alerts::list_alerts(&conn, &identity.scope())?;
    Ok(Json(listed))
}

#[derive(Serialize)]
pub struct AlertDetailResponse {
    #[serde(flatten)]
    pub detail: AlertDetail,
    /// Reverse-geocoded address, or the raw coordinates on failure.
    pub address: String,
}

/// `GET /api/alerts/:id` — detail with action log, reporter join
/// (responders only), and a resolved address string.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertDetailResponse>, ApiError> {
    let detail = {
        let conn = ctx.state.db()?;
        alerts::get_alert_detail(&conn, &identity.scope(), &id)?
    }; // DB lock released before the outbound geocode call

    let address = ctx
        .geocoder
        .reverse(detail.alert.latitude, detail.alert.longitude)
        .await;

    Ok(Json(AlertDetailResponse { detail, address }))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AlertStatus,
}

/// `PUT /api/alerts/:id/status` — advance the lifecycle (verified
/// responders only; forward-only).
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Alert>, ApiError> {
    let conn = ctx.state.db()?;
    let alert = alerts::update_status(&conn, &ctx.state.hub, &identity, &id, request.status)?;
    Ok(Json(alert))
}

#[derive(Deserialize)]
pub struct AddResponseRequest {
    pub action: String,
}

/// `POST /api/alerts/:id/responses` — append to the action log.
pub async fn add_response(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddResponseRequest>,
) -> Result<Json<AlertResponse>, ApiError> {
    if request.action.trim().is_empty() {
        return Err(ApiError::BadRequest("Action description is required".into()));
    }
    let conn = ctx.state.db()?;
    let response =
        alerts::add_response(&conn, &ctx.state.hub, &identity, &id, request.action.trim())?;
    Ok(Json(response))
}
