//! Admin middleware: runs the authorization gate for admin routes.
//!
//! Must be layered inside [`super::auth::require_auth`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use stride_core::models::auth::AdminSession;
use tracing::debug;

use super::auth::AuthenticatedUser;
use crate::AppState;
use crate::error::AppError;

/// Granted admin session, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AdminContext(pub AdminSession);

/// Axum middleware: grants or denies admin access for the verified caller.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let AuthenticatedUser(claims) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::Internal("admin route mounted without require_auth".into()))?;

    let session = state.gate.authorize(&claims).await.map_err(|e| {
        debug!(reason = %e, "admin access denied");
        AppError::from(e)
    })?;
    request.extensions_mut().insert(AdminContext(session));

    Ok(next.run(request).await)
}
