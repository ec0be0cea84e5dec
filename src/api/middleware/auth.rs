//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it to an
//! `Identity` through the sessions table, and injects the identity
//! into request extensions for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;

/// Require a valid bearer session token.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success the caller's `Identity` is available
/// to handlers via `Extension<Identity>`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let identity = {
        let conn = ctx.state.db()?;
        auth::authenticate(&conn, &token)?
    }; // MutexGuard dropped here, before any .await

    req.extensions_mut().insert(identity);
    // Keep the raw token around for sign-out
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}

/// The raw bearer token of the current request; sign-out needs it to
/// delete the right session row.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);
