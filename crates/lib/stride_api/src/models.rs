//! Request/response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stride_core::models::auth::AdminSession;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `GET /api/health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Active admin session as seen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionResponse {
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<AdminSession> for AdminSessionResponse {
    fn from(session: AdminSession) -> Self {
        Self {
            subject_id: session.subject_id,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        }
    }
}
