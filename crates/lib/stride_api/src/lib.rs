//! # stride_api
//!
//! HTTP API library for Stride admin sessions.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use stride_core::session::AuthorizationGate;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{admin, health};

/// Public liveness route.
pub const GET_API_HEALTH: &str = "/api/health";

/// Admin session route (`GET` reads, `DELETE` ends the session).
pub const ADMIN_SESSION: &str = "/admin/session";

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Admin authorization gate, shared by all requests.
    pub gate: Arc<AuthorizationGate>,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new().route(GET_API_HEALTH, get(health::health));

    // Authenticated routes; reading the session additionally requires the admin gate.
    let authenticated = Router::new()
        .route(
            ADMIN_SESSION,
            get(admin::current_session_handler)
                .route_layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::admin::require_admin,
                ))
                .delete(admin::end_session_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .layer(cors)
        .with_state(state)
}
