//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`; the WebSocket upgrade lives at
//! `/ws/connect` with its own ticket-based auth.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` via `with_state`.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::api::websocket;

/// Build the full API router.
pub fn api_router(ctx: ApiContext) -> Router {
    // Protected routes — bearer session required
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/session", get(endpoints::auth::session))
        .route("/auth/signout", post(endpoints::auth::signout))
        .route("/auth/ws-ticket", post(endpoints::auth::ws_ticket))
        .route("/alerts", post(endpoints::alerts::create))
        .route("/alerts", get(endpoints::alerts::list))
        .route("/alerts/:id", get(endpoints::alerts::detail))
        .route("/alerts/:id/status", put(endpoints::alerts::update_status))
        .route("/alerts/:id/responses", post(endpoints::alerts::add_response))
        .route("/contacts", get(endpoints::contacts::list))
        .route("/contacts", post(endpoints::contacts::create))
        .route("/contacts/:id", put(endpoints::contacts::update))
        .route("/contacts/:id", delete(endpoints::contacts::delete))
        .route("/contacts/:id/primary", put(endpoints::contacts::set_primary))
        .route("/profile", get(endpoints::profile::get))
        .route("/profile", put(endpoints::profile::update))
        .route(
            "/profile/notification-token",
            put(endpoints::profile::set_notification_token),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes — account creation and sign-in
    let unprotected = Router::new()
        .route("/auth/signup", post(endpoints::auth::signup))
        .route(
            "/auth/signup-responder",
            post(endpoints::auth::signup_responder),
        )
        .route("/auth/signin", post(endpoints::auth::signin))
        .with_state(ctx.clone());

    // WebSocket upgrade route (ticket-based auth)
    let ws_routes = Router::new()
        .route("/ws/connect", get(websocket::ws_upgrade))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}
