use chrono::{DateTime, Utc};
use skydrive_core::{models::Session, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for login sessions
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "insert"))]
    pub async fn create(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = sqlx::query_as::<Postgres, Session>(
            r#"
            INSERT INTO sessions (user_id, expires_at)
            VALUES ($1, $2)
            RETURNING id, user_id, created_at, expires_at
            "#,
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Session that belongs to `user_id` and has not expired yet.
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "select", db.record_id = %id))]
    pub async fn find_active(&self, id: Uuid, user_id: Uuid) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<Postgres, Session>(
            r#"
            SELECT id, user_id, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND user_id = $2 AND expires_at > NOW()
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Returns `false` when the session was already gone.
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "delete"))]
    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
