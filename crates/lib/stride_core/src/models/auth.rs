//! Authentication and session domain models.
//!
//! Shared by the client-side token provider and the server-side
//! authorization gate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Claims carried by an identity token.
///
/// Every claim is optional at this layer: the token provider and the
/// authorization gate each decide what a missing or malformed claim means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user ID (standard JWT `sub` claim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// User email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (unix timestamp).
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,
    /// Expiry (unix timestamp).
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Subject claim, treating an empty string as absent.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.is_empty())
    }

    /// `iat` as a timestamp, if present and representable.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// `exp` as a timestamp, if present and representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Accepts integer, float or numeric-string timestamps; anything else is `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

/// The client's single cached credential for the signed-in identity.
///
/// Replaced wholesale on every refresh, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCacheEntry {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Identity that was signed in when the token was fetched.
    pub subject_id: Option<String>,
}

impl TokenCacheEntry {
    /// Whether the entry can still be handed out at `now`, keeping
    /// `early_refresh_window` of margin before the real expiry.
    ///
    /// A margin that cannot be represented leaves the entry stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, early_refresh_window: Duration) -> bool {
        self.expires_at
            .checked_sub_signed(early_refresh_window)
            .is_some_and(|stale_at| now < stale_at)
    }

    /// Whether the entry was fetched for `subject_id`. Nobody signed in
    /// matches nothing.
    pub fn belongs_to(&self, subject_id: Option<&str>) -> bool {
        subject_id.is_some() && self.subject_id.as_deref() == subject_id
    }
}

/// A time-bounded grant of admin privilege for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Open a session at `issued_at` lasting `ttl`, or `None` when the
    /// expiry falls outside the representable time range.
    pub fn try_new(
        subject_id: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        Some(Self {
            subject_id: subject_id.into(),
            issued_at,
            expires_at: issued_at.checked_add_signed(ttl)?,
        })
    }

    /// A session is usable strictly before its expiry.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Answer from the external "is this user an admin" data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeRecord {
    pub found: bool,
    pub is_privileged: bool,
}

impl PrivilegeRecord {
    pub fn admin() -> Self {
        Self {
            found: true,
            is_privileged: true,
        }
    }

    pub fn regular() -> Self {
        Self {
            found: true,
            is_privileged: false,
        }
    }

    pub fn not_found() -> Self {
        Self::default()
    }

    /// Only a found, flagged subject is privileged.
    pub fn grants_admin(&self) -> bool {
        self.found && self.is_privileged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn claims_parse_numeric_and_string_timestamps() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"sub":"u1","iat":1700000000,"exp":"1700003600"}"#).unwrap();
        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.iat, Some(1_700_000_000));
        assert_eq!(claims.exp, Some(1_700_003_600));
    }

    #[test]
    fn claims_treat_garbage_timestamps_as_absent() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"sub":"u1","iat":"yesterday","exp":{"at":1}}"#).unwrap();
        assert_eq!(claims.iat, None);
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn claims_accept_float_timestamps() {
        let claims: TokenClaims = serde_json::from_str(r#"{"iat":1700000000.75}"#).unwrap();
        assert_eq!(claims.iat, Some(1_700_000_000));
    }

    #[test]
    fn empty_subject_is_absent() {
        let claims = TokenClaims {
            sub: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(claims.subject(), None);
    }

    #[test]
    fn admin_session_expiry_is_fixed_at_creation() {
        let session = AdminSession::try_new("u1", ts(1_000), Duration::minutes(10)).unwrap();
        assert_eq!(session.expires_at, ts(1_600));
        assert!(session.is_active(ts(1_599)));
        assert!(!session.is_active(ts(1_600)));
    }

    #[test]
    fn cache_entry_goes_stale_inside_early_window() {
        let entry = TokenCacheEntry {
            token: "abc".into(),
            expires_at: ts(1_000),
            subject_id: Some("u1".into()),
        };
        let window = Duration::seconds(120);
        assert!(entry.is_fresh(ts(879), window));
        assert!(!entry.is_fresh(ts(880), window));
        assert!(!entry.is_fresh(ts(940), window));
    }

    #[test]
    fn huge_early_window_makes_entry_stale_instead_of_panicking() {
        let entry = TokenCacheEntry {
            token: "abc".into(),
            expires_at: ts(1_000),
            subject_id: Some("u1".into()),
        };
        assert!(!entry.is_fresh(ts(0), Duration::MAX));
        assert!(!entry.is_fresh(ts(0), Duration::seconds(1_000_000_000_000_000)));
    }

    #[test]
    fn cache_entry_belongs_only_to_its_subject() {
        let entry = TokenCacheEntry {
            token: "abc".into(),
            expires_at: ts(1_000),
            subject_id: Some("alice".into()),
        };
        assert!(entry.belongs_to(Some("alice")));
        assert!(!entry.belongs_to(Some("bob")));
        assert!(!entry.belongs_to(None));

        let anonymous = TokenCacheEntry {
            subject_id: None,
            ..entry
        };
        assert!(!anonymous.belongs_to(None));
    }

    #[test]
    fn admin_session_with_unrepresentable_expiry_is_refused() {
        assert!(AdminSession::try_new("u1", ts(1_000), Duration::MAX).is_none());
        assert!(AdminSession::try_new("u1", DateTime::<Utc>::MAX_UTC, Duration::minutes(1)).is_none());
    }

    #[test]
    fn privilege_record_requires_found_and_flag() {
        assert!(PrivilegeRecord::admin().grants_admin());
        assert!(!PrivilegeRecord::regular().grants_admin());
        assert!(!PrivilegeRecord::not_found().grants_admin());
        let odd = PrivilegeRecord {
            found: false,
            is_privileged: true,
        };
        assert!(!odd.grants_admin());
    }
}
