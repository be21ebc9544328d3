//! Unverified claim decoding.
//!
//! The client never checks signatures; it only peeks at `exp` to schedule
//! refreshes. Nothing decoded here may be used for an access decision.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use tracing::debug;

use crate::models::auth::TokenClaims;

/// Decode a token's claims without validating signature, audience or expiry.
pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
    let header = match decode_header(token) {
        Ok(header) => header,
        Err(e) => {
            debug!(error = %e, "token header is not decodable");
            return None;
        }
    };

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    match decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            debug!(error = %e, "token claims are not decodable");
            None
        }
    }
}

/// The token's `exp` claim, or `None` if it is missing or malformed.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    decode_unverified(token).and_then(|claims| claims.expires_at())
}
