//! Emergency contact endpoints. Civilian accounts manage their own
//! contacts; responders reach contact data only through alert detail.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::contacts::{self, ContactInput};
use crate::models::Contact;

fn own_user_id(identity: &Identity) -> Result<Uuid, ApiError> {
    match identity {
        Identity::Civilian(user) => Ok(user.id),
        Identity::Responder(_) => Err(ApiError::Forbidden(
            "Responder accounts do not have emergency contacts".into(),
        )),
    }
}

#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub make_primary: bool,
}

impl From<ContactRequest> for ContactInput {
    fn from(request: ContactRequest) -> Self {
        ContactInput {
            name: request.name,
            relationship: request.relationship,
            phone: request.phone,
            email: request.email,
            make_primary: request.make_primary,
        }
    }
}

/// `GET /api/contacts`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let user_id = own_user_id(&identity)?;
    let conn = ctx.state.db()?;
    Ok(Json(contacts::list_contacts(&conn, &user_id)?))
}

/// `POST /api/contacts`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    let user_id = own_user_id(&identity)?;
    let mut conn = ctx.state.db()?;
    Ok(Json(contacts::add_contact(
        &mut conn,
        &user_id,
        &request.into(),
    )?))
}

/// `PUT /api/contacts/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<Contact>, ApiError> {
    let user_id = own_user_id(&identity)?;
    let mut conn = ctx.state.db()?;
    Ok(Json(contacts::update_contact(
        &mut conn,
        &user_id,
        &id,
        &request.into(),
    )?))
}

/// `DELETE /api/contacts/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = own_user_id(&identity)?;
    let conn = ctx.state.db()?;
    contacts::delete_contact(&conn, &user_id, &id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// `PUT /api/contacts/:id/primary` — promote to the single primary.
pub async fn set_primary(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = own_user_id(&identity)?;
    let mut conn = ctx.state.db()?;
    contacts::set_primary(&mut conn, &user_id, &id)?;
    Ok(Json(serde_json::json!({ "primary": id })))
}
