//! HTTP identity provider.
//!
//! Exchanges the signed-in user's refresh credential for a new identity
//! token at a secure-token endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::token_provider::{IdentityError, IdentityProvider};

/// The user currently signed in on this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub subject_id: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
    force_refresh: bool,
}

/// Response from the secure-token endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// [`IdentityProvider`] talking to a secure-token endpoint over HTTP.
pub struct HttpIdentityProvider {
    client: Client,
    endpoint: String,
    user: RwLock<Option<SignedInUser>>,
}

impl HttpIdentityProvider {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            user: RwLock::new(None),
        }
    }

    /// Record a signed-in user.
    pub async fn sign_in(&self, user: SignedInUser) {
        info!(subject = %user.subject_id, "signed in");
        *self.user.write().await = Some(user);
    }

    /// Forget the signed-in user.
    pub async fn sign_out(&self) {
        if let Some(user) = self.user.write().await.take() {
            info!(subject = %user.subject_id, "signed out");
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn refresh(&self, force_network: bool) -> Result<String, IdentityError> {
        let refresh_token = self
            .user
            .read()
            .await
            .as_ref()
            .map(|u| u.refresh_token.clone())
            .ok_or(IdentityError::NotSignedIn)?;

        let body = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token: &refresh_token,
            force_refresh: force_network,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected { status, body });
        }

        let parsed = resp
            .json::<RefreshResponse>()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        if let Some(rotated) = parsed.refresh_token {
            let mut guard = self.user.write().await;
            if let Some(user) = guard.as_mut() {
                debug!(subject = %user.subject_id, "refresh credential rotated");
                user.refresh_token = rotated;
            }
        }

        Ok(parsed.id_token)
    }

    async fn current_subject(&self) -> Option<String> {
        self.user.read().await.as_ref().map(|u| u.subject_id.clone())
    }
}
