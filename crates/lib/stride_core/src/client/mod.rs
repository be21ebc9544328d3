//! Client-side identity handling.
//!
//! [`token_provider::TokenProvider`] keeps the current bearer token fresh;
//! [`authorized_get`] attaches it to a request and retries once with a forced
//! refresh when the server rejects it.

pub mod identity;
pub mod token_provider;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::debug;

pub use identity::{HttpIdentityProvider, SignedInUser};
pub use token_provider::{
    IdentityError, IdentityProvider, TokenError, TokenProvider, TokenProviderConfig,
};

/// Errors from an authorized request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// GET `url` with `Authorization: Bearer <token>`.
///
/// A `401`/`403` answer is treated as a possibly stale token: the token is
/// force-refreshed and the request retried exactly once.
pub async fn authorized_get(
    client: &Client,
    tokens: &TokenProvider,
    url: &str,
) -> Result<Response, RequestError> {
    let token = tokens.cached_or_fresh().await?;
    let resp = client.get(url).bearer_auth(&token).send().await?;

    if !is_rejection(resp.status()) {
        return Ok(resp);
    }

    debug!(status = %resp.status(), "request rejected, retrying with a fresh token");
    let token = tokens.force_fresh().await?;
    Ok(client.get(url).bearer_auth(&token).send().await?)
}

fn is_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_statuses_trigger_retry() {
        assert!(is_rejection(StatusCode::UNAUTHORIZED));
        assert!(is_rejection(StatusCode::FORBIDDEN));
        assert!(!is_rejection(StatusCode::OK));
        assert!(!is_rejection(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
