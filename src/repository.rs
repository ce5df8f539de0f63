use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{ResolvedSession, SessionRow, SessionUser};

/// SessionRepository
///
/// Read-only access to the auth provider's session store. Handlers and the web proxy
/// only see this trait, so tests can swap in an in-memory store.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Looks up an unexpired session by its token.
    async fn find_session(&self, token: &str) -> Result<Option<ResolvedSession>, sqlx::Error>;

    async fn get_user(&self, id: &str) -> Result<Option<SessionUser>, sqlx::Error>;
}

/// RepositoryState
///
/// Shared handle to the session store used by the application state.
pub type RepositoryState = Arc<dyn SessionRepository>;

/// PostgresRepository
///
/// `SessionRepository` over the provider's `"session"` and `"user"` tables, which use
/// camelCase column names.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresRepository {
    /// find_session
    ///
    /// Expiry is checked in the query so an expired token behaves exactly like an
    /// unknown one.
    async fn find_session(&self, token: &str) -> Result<Option<ResolvedSession>, sqlx::Error> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT u.id, u.name, u.email, u.image, s."expiresAt" AS expires_at
            FROM "session" s
            JOIN "user" u ON u.id = s."userId"
            WHERE s.token = $1 AND s."expiresAt" > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ResolvedSession::from))
    }

    async fn get_user(&self, id: &str) -> Result<Option<SessionUser>, sqlx::Error> {
        sqlx::query_as::<_, SessionUser>(
            r#"SELECT id, name, email, image FROM "user" WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
