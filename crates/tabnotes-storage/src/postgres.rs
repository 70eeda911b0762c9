// PostgreSQL implementations of SessionStore and UserDirectory
// Decision: Runtime-checked queries (query_as) so the crate builds without a live database
// Decision: The magic-link exchange is one conditional UPDATE ... RETURNING

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, instrument};
use uuid::Uuid;

use tabnotes_core::{
    normalize_email, NewSession, Session, SessionStore, StoreError, TokenExchange, User,
    UserDirectory,
};

const SESSION_COLUMNS: &str =
    "id, token, user_id, created_at, expires_at, verified_at, revoked_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct SessionRow {
    id: Uuid,
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            token: row.token,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
            verified_at: row.verified_at,
            revoked_at: row.revoked_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

/// Map a sqlx error, logging anything that is not a token collision
fn store_error(operation: &'static str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        // 23505: unique_violation
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some("uq_sessions_token")
        {
            return StoreError::DuplicateToken;
        }
    }
    error!(operation, error = %e, "database query failed");
    StoreError::Database(e.to_string())
}

/// PostgreSQL session store
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            INSERT INTO sessions (id, token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("create_session", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self, token))]
    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get_session_by_token", e))?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn get_session_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("get_session_by_id", e))?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn update_session(&self, session: &Session) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET token = $2, expires_at = $3, verified_at = $4, revoked_at = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(&session.token)
        .bind(session.expires_at)
        .bind(session.verified_at)
        .bind(session.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("update_session", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, current_token, exchange))]
    async fn exchange_token(
        &self,
        id: Uuid,
        current_token: &str,
        exchange: TokenExchange,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            UPDATE sessions
            SET token = $3, expires_at = $4, verified_at = $5, updated_at = $5
            WHERE id = $1
              AND token = $2
              AND verified_at IS NULL
              AND revoked_at IS NULL
              AND expires_at >= $6
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(current_token)
        .bind(&exchange.token)
        .bind(exchange.expires_at)
        .bind(exchange.verified_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("exchange_token", e))?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete_session", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn get_sessions_by_user_id(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("get_sessions_by_user_id", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE sessions SET revoked_at = $2, updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(at)
                .execute(&self.pool)
                .await
                .map_err(|e| store_error("revoke_session", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn revoke_all_sessions_by_user_id(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $2, updated_at = $2 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("revoke_all_sessions_by_user_id", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn revoke_all_sessions_by_user_id_except(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked_at = $3, updated_at = $3
            WHERE user_id = $1 AND id <> $2
            "#,
        )
        .bind(user_id)
        .bind(current_session_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("revoke_all_sessions_by_user_id_except", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn is_session_revoked(&self, id: Uuid) -> Result<Option<bool>, StoreError> {
        let revoked: Option<bool> =
            sqlx::query_scalar("SELECT revoked_at IS NOT NULL FROM sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("is_session_revoked", e))?;

        Ok(revoked)
    }

    #[instrument(skip(self))]
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete_expired_sessions", e))?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("ping", e))?;
        Ok(())
    }
}

/// PostgreSQL user directory
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user, or return the existing one with the same email
    #[instrument(skip(self))]
    pub async fn upsert_user(&self, name: &str, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET email = users.email
            RETURNING id, name, email
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(normalize_email(email))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("upsert_user", e))?;

        Ok(row.into())
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_by_email", e))?;

        Ok(row.map(Into::into))
    }
}
