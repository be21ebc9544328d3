use std::sync::Arc;

use reqwest::Client;
use stride_core::client::{
    HttpIdentityProvider, RequestError, SignedInUser, TokenProvider, TokenProviderConfig,
    authorized_get,
};
use stride_core::clock::SystemClock;

use crate::cli::IdentityArgs;
use crate::{Error, Result};

/// Token provider for the identity given on the command line.
pub async fn token_provider(client: &Client, args: &IdentityArgs) -> Result<TokenProvider> {
    let endpoint = args
        .identity_url
        .clone()
        .ok_or_else(|| Error::Custom("no identity endpoint; set STRIDE_IDENTITY_URL".into()))?;

    let identity = HttpIdentityProvider::new(client.clone(), endpoint);
    if let Some(user) = signed_in_user(args) {
        identity.sign_in(user).await;
    }

    Ok(TokenProvider::new(
        Arc::new(identity),
        Arc::new(SystemClock),
        TokenProviderConfig::from_env(),
    ))
}

/// The user given on the command line; both subject and refresh credential
/// are needed to count as signed in.
fn signed_in_user(args: &IdentityArgs) -> Option<SignedInUser> {
    match (&args.subject, &args.refresh_token) {
        (Some(subject_id), Some(refresh_token)) => Some(SignedInUser {
            subject_id: subject_id.clone(),
            refresh_token: refresh_token.clone(),
        }),
        _ => None,
    }
}

/// Print the signed-in subject. Needs no identity endpoint.
pub fn whoami(args: &IdentityArgs) -> Result<()> {
    match signed_in_user(args) {
        Some(user) => println!("{}", user.subject_id),
        None => println!("not signed in"),
    }
    Ok(())
}

pub async fn token(client: &Client, args: &IdentityArgs, force: bool) -> Result<()> {
    let tokens = token_provider(client, args).await?;
    let token = if force {
        tokens.force_fresh().await?
    } else {
        tokens.cached_or_fresh().await?
    };
    log::info!(
        "token issued for {}",
        tokens.current_subject_id().await.unwrap_or_default()
    );
    println!("{token}");
    Ok(())
}

pub async fn admin_session(client: &Client, args: &IdentityArgs, api_url: &str) -> Result<()> {
    let tokens = token_provider(client, args).await?;
    let url = format!("{}/admin/session", api_url.trim_end_matches('/'));

    let resp = authorized_get(client, &tokens, &url).await?;
    let status = resp.status();
    let body = resp.text().await.map_err(RequestError::from)?;

    if !status.is_success() {
        return Err(Error::Custom(format!("{url} returned {status}: {body}")));
    }
    println!("{body}");
    Ok(())
}
