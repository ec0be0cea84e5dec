//! Account endpoints: signup (civilian and responder), signin, signout,
//! current-session lookup, and WebSocket upgrade tickets.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::middleware::auth::BearerToken;
use crate::api::types::ApiContext;
use crate::auth::{self, Identity, NewResponder, NewUser};
use crate::models::{Responder, ResponderKind, User};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub phone: String,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/auth/signup` — create a civilian account.
pub async fn signup(
    State(ctx): State<ApiContext>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let new = NewUser {
        email: request.email,
        password: request.password,
        display_name: request.display_name,
        phone: request.phone,
        medical_conditions: request.medical_conditions,
        blood_type: request.blood_type,
    };
    let mut conn = ctx.state.db()?;
    let (user, token) = auth::signup_user(&mut conn, &new)?;
    Ok(Json(SignupResponse { token, user }))
}

#[derive(Deserialize)]
pub struct ResponderSignupRequest {
    pub email: String,
    pub password: String,
    pub organization: String,
    pub kind: ResponderKind,
    pub jurisdiction: String,
}

#[derive(Serialize)]
pub struct ResponderSignupResponse {
    pub token: String,
    pub responder: Responder,
}

/// `POST /api/auth/signup-responder` — create a responder account
/// (starts unverified; verification is an operator action).
pub async fn signup_responder(
    State(ctx): State<ApiContext>,
    Json(request): Json<ResponderSignupRequest>,
) -> Result<Json<ResponderSignupResponse>, ApiError> {
    let new = NewResponder {
        email: request.email,
        password: request.password,
        organization: request.organization,
        kind: request.kind,
        jurisdiction: request.jurisdiction,
    };
    let mut conn = ctx.state.db()?;
    let (responder, token) = auth::signup_responder(&mut conn, &new)?;
    Ok(Json(ResponderSignupResponse { token, responder }))
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SigninResponse {
    pub token: String,
    #[serde(flatten)]
    pub session: SessionBody,
}

/// `POST /api/auth/signin`
pub async fn signin(
    State(ctx): State<ApiContext>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let conn = ctx.state.db()?;
    let (identity, token) = auth::signin(&conn, &request.email, &request.password)?;
    Ok(Json(SigninResponse {
        token,
        session: SessionBody::from(&identity),
    }))
}

/// `POST /api/auth/signout` — invalidate the current session. Idempotent.
pub async fn signout(
    State(ctx): State<ApiContext>,
    Extension(token): Extension<BearerToken>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.db()?;
    auth::signout(&conn, &token.0)?;
    Ok(Json(serde_json::json!({ "signed_out": true })))
}

/// The caller's identity, shaped for clients.
#[derive(Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum SessionBody {
    Civilian { user: User },
    Responder { responder: Responder },
}

impl From<&Identity> for SessionBody {
    fn from(identity: &Identity) -> Self {
        match identity {
            Identity::Civilian(user) => SessionBody::Civilian { user: user.clone() },
            Identity::Responder(responder) => SessionBody::Responder {
                responder: responder.clone(),
            },
        }
    }
}

/// `GET /api/auth/session` — who am I?
pub async fn session(
    Extension(identity): Extension<Identity>,
) -> Result<Json<SessionBody>, ApiError> {
    Ok(Json(SessionBody::from(&identity)))
}

#[derive(Serialize)]
pub struct WsTicketResponse {
    pub ticket: String,
    pub expires_in: u32,
}

/// `POST /api/auth/ws-ticket` — one-time WebSocket upgrade ticket.
///
/// The client uses this ticket in the upgrade query string instead of
/// exposing the session token in a URL.
pub async fn ws_ticket(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<WsTicketResponse>, ApiError> {
    let ticket = {
        let mut tickets = ctx
            .ws_tickets
            .lock()
            .map_err(|_| ApiError::Internal("ticket lock".into()))?;
        tickets.issue(identity.account_id())
    };

    Ok(Json(WsTicketResponse {
        ticket,
        expires_in: 30,
    }))
}
