use skydrive_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for the file sharing relation
#[derive(Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grant `shared_with` read access to `file_id` and mark the file shared.
    ///
    /// Returns `false` when the file was already shared with that user.
    #[tracing::instrument(skip(self), fields(db.table = "shared", db.operation = "insert", db.record_id = %file_id))]
    pub async fn share(&self, file_id: Uuid, shared_with: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO shared (file_id, shared_with)
            VALUES ($1, $2)
            ON CONFLICT (file_id, shared_with) DO NOTHING
            "#,
        )
        .bind(file_id)
        .bind(shared_with)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query("UPDATE files SET is_shared = TRUE WHERE id = $1")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Owner or share recipient
    #[tracing::instrument(skip(self), fields(db.table = "shared", db.operation = "select", db.record_id = %file_id))]
    pub async fn has_access(&self, file_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let allowed = sqlx::query_scalar::<Postgres, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM files WHERE id = $1 AND owner = $2
                UNION ALL
                SELECT 1 FROM shared WHERE file_id = $1 AND shared_with = $2
            )
            "#,
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(allowed)
    }

    /// Emails of every recipient, in the order they were added
    #[tracing::instrument(skip(self), fields(db.table = "shared", db.operation = "select", db.record_id = %file_id))]
    pub async fn shared_emails(&self, file_id: Uuid) -> Result<Vec<String>, AppError> {
        let emails = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT u.email
            FROM shared s
            JOIN users u ON u.id = s.shared_with
            WHERE s.file_id = $1
            ORDER BY s.created_at ASC, u.email ASC
            "#,
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(emails)
    }
}
