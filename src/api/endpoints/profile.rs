//! Profile endpoints: read/edit the caller's own record and register
//! a push notification token against it.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::endpoints::auth::SessionBody;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::db::repository;
use crate::models::User;

/// `GET /api/profile` — the caller's own profile.
pub async fn get(
    Extension(identity): Extension<Identity>,
) -> Result<Json<SessionBody>, ApiError> {
    Ok(Json(SessionBody::from(&identity)))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
    pub phone: String,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
}

/// `PUT /api/profile` — civilian profile edit.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let user = match &identity {
        Identity::Civilian(user) => user,
        Identity::Responder(_) => {
            return Err(ApiError::Forbidden(
                "Responder profiles are managed by their organization".into(),
            ))
        }
    };

    let updated = User {
        id: user.id,
        display_name: request.display_name,
        phone: request.phone,
        medical_conditions: request.medical_conditions,
        blood_type: request.blood_type,
        notification_token: user.notification_token.clone(),
    };
    let conn = ctx.state.db()?;
    repository::update_user(&conn, &updated)?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct NotificationTokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// `PUT /api/profile/notification-token` — store or clear the device
/// push token on the caller's record.
pub async fn set_notification_token(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<NotificationTokenRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.db()?;
    match &identity {
        Identity::Civilian(user) => {
            repository::set_user_notification_token(&conn, &user.id, request.token.as_deref())?
        }
        Identity::Responder(responder) => repository::set_responder_notification_token(
            &conn,
            &responder.id,
            request.token.as_deref(),
        )?,
    }
    Ok(Json(serde_json::json!({ "registered": request.token.is_some() })))
}
