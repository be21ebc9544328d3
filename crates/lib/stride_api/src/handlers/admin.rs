//! Admin session handlers.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::admin::AdminContext;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::AdminSessionResponse;

/// `GET /admin/session`: the caller's active admin session.
pub async fn current_session_handler(
    Extension(AdminContext(session)): Extension<AdminContext>,
) -> Json<AdminSessionResponse> {
    Json(session.into())
}

/// `DELETE /admin/session`: leave admin mode.
pub async fn end_session_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
) -> AppResult<StatusCode> {
    let subject = claims
        .subject()
        .ok_or_else(|| AppError::Unauthorized("Token carries no subject".into()))?;
    state.gate.end_session(subject);
    Ok(StatusCode::NO_CONTENT)
}
