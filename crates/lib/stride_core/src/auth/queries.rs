//! Auth-related database queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::PrivilegeRecord;
use crate::session::gate::PrivilegeLookup;

/// Role name that grants admin mode.
pub const ADMIN_ROLE: &str = "admin";

/// Look up whether a user exists and holds the admin role.
///
/// Ids are compared as text so a subject that is not a UUID is simply
/// "not found" rather than a query error.
pub async fn find_privilege(pool: &PgPool, user_id: &str) -> Result<PrivilegeRecord, AuthError> {
    let (found, is_privileged) = sqlx::query_as::<_, (bool, bool)>(
        "SELECT \
           EXISTS(SELECT 1 FROM users WHERE id::text = $1), \
           EXISTS(SELECT 1 FROM user_roles WHERE user_id::text = $1 AND role::text = $2)",
    )
    .bind(user_id)
    .bind(ADMIN_ROLE)
    .fetch_one(pool)
    .await?;
    Ok(PrivilegeRecord {
        found,
        is_privileged,
    })
}

/// [`PrivilegeLookup`] backed by the `users` / `user_roles` tables.
#[derive(Clone)]
pub struct PgPrivilegeLookup {
    pool: PgPool,
}

impl PgPrivilegeLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrivilegeLookup for PgPrivilegeLookup {
    async fn lookup_privilege(&self, subject_id: &str) -> Result<PrivilegeRecord, AuthError> {
        find_privilege(&self.pool, subject_id).await
    }
}
