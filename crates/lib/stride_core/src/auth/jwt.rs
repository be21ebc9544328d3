//! JWT verification and signing.

use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, warn};

use super::AuthError;
use crate::config::env_lookup;
use crate::models::auth::TokenClaims;

/// Verify an HS256 access token, returning its claims on success.
///
/// Signature and `exp` are enforced here; `sub` and `iat` are left for the
/// authorization gate to judge.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Option<TokenClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);
    match decode::<TokenClaims>(token, &key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            debug!(error = %e, "access token rejected");
            None
        }
    }
}

/// Sign `claims` as an HS256 JWT.
///
/// Issuance belongs to the identity provider; this exists for local tooling
/// and tests that need tokens the server will accept.
pub fn sign_claims(claims: &TokenClaims, secret: &[u8]) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> Result<String, AuthError> {
    resolve_jwt_secret_with(env_lookup, &jwt_secret_path())
}

/// [`resolve_jwt_secret`] over an arbitrary variable source and secret file.
///
/// When neither variable is set and the file is missing or empty, a random
/// secret is generated and written to `secret_path`. Failing to read or
/// persist the file is an error.
pub fn resolve_jwt_secret_with<F>(lookup: F, secret_path: &Path) -> Result<String, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    for name in ["JWT_SECRET", "AUTH_SECRET"] {
        if let Some(secret) = lookup(name).filter(|s| !s.is_empty()) {
            return Ok(secret);
        }
    }

    match std::fs::read_to_string(secret_path) {
        Ok(existing) if !existing.trim().is_empty() => return Ok(existing.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(AuthError::Internal(format!(
                "read JWT secret {}: {e}",
                secret_path.display()
            )));
        }
    }

    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AuthError::Internal(format!("create {}: {e}", parent.display()))
        })?;
    }
    std::fs::write(secret_path, &secret).map_err(|e| {
        AuthError::Internal(format!("write JWT secret {}: {e}", secret_path.display()))
    })?;
    warn!(
        path = %secret_path.display(),
        "no JWT_SECRET or AUTH_SECRET set; generated a local secret that will not verify tokens from an external issuer"
    );
    Ok(secret)
}

/// Default location of the persisted JWT secret file.
pub fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stride")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn claims(sub: Option<&str>, iat: Option<i64>, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: sub.map(str::to_string),
            email: None,
            iat,
            exp: Some(exp),
        }
    }

    #[test]
    fn verify_roundtrips_signed_claims() {
        let now = Utc::now().timestamp();
        let token = sign_claims(&claims(Some("u1"), Some(now), now + 600), SECRET).unwrap();
        let verified = verify_access_token(&token, SECRET).expect("valid token");
        assert_eq!(verified.subject(), Some("u1"));
        assert_eq!(verified.iat, Some(now));
    }

    #[test]
    fn verify_keeps_tokens_without_iat_or_sub() {
        let now = Utc::now().timestamp();
        let token = sign_claims(&claims(None, None, now + 600), SECRET).unwrap();
        let verified = verify_access_token(&token, SECRET).expect("signature is valid");
        assert_eq!(verified.sub, None);
        assert_eq!(verified.iat, None);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let now = Utc::now().timestamp();
        let token = sign_claims(&claims(Some("u1"), Some(now), now + 600), SECRET).unwrap();
        assert!(verify_access_token(&token, b"other-secret").is_none());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let now = Utc::now().timestamp();
        let token = sign_claims(&claims(Some("u1"), Some(now - 7200), now - 3600), SECRET).unwrap();
        assert!(verify_access_token(&token, SECRET).is_none());
    }

    #[test]
    fn verify_rejects_token_without_exp() {
        let token = sign_claims(
            &TokenClaims {
                sub: Some("u1".into()),
                ..Default::default()
            },
            SECRET,
        )
        .unwrap();
        assert!(verify_access_token(&token, SECRET).is_none());
    }

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn secret_prefers_jwt_secret_then_auth_secret() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jwt-secret");

        let both = |name: &str| match name {
            "JWT_SECRET" => Some("primary".to_string()),
            "AUTH_SECRET" => Some("fallback".to_string()),
            _ => None,
        };
        assert_eq!(resolve_jwt_secret_with(both, &path).unwrap(), "primary");

        let auth_only = |name: &str| (name == "AUTH_SECRET").then(|| "fallback".to_string());
        assert_eq!(resolve_jwt_secret_with(auth_only, &path).unwrap(), "fallback");
        assert!(!path.exists());
    }

    #[test]
    fn empty_env_secret_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jwt-secret");
        std::fs::write(&path, "from-file\n").unwrap();

        let empty = |name: &str| (name == "JWT_SECRET").then(String::new);
        assert_eq!(resolve_jwt_secret_with(empty, &path).unwrap(), "from-file");
    }

    #[test]
    fn generated_secret_is_persisted_and_reused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stride").join("jwt-secret");

        let first = resolve_jwt_secret_with(no_vars, &path).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
        assert_eq!(resolve_jwt_secret_with(no_vars, &path).unwrap(), first);
    }

    #[test]
    fn unwritable_secret_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let path = blocker.join("jwt-secret");

        let err = resolve_jwt_secret_with(no_vars, &path).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
