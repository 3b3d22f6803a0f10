use skydrive_core::{
    models::{FileRecord, FileSummary, NewFile, PreviewStatus},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const FILE_COLUMNS: &str = "id, filename, owner, file_url, storage_key, preview_image, preview_status, is_shared, created_at";

/// Repository for uploaded files
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, file), fields(db.table = "files", db.operation = "insert", db.record_id = %file.id))]
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord, AppError> {
        let query = format!(
            r#"
            INSERT INTO files (id, filename, owner, file_url, storage_key, preview_image, preview_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(file.id)
            .bind(&file.filename)
            .bind(file.owner)
            .bind(&file.file_url)
            .bind(&file.storage_key)
            .bind(&file.preview_image)
            .bind(file.preview_status)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let query = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1");
        let record = sqlx::query_as::<Postgres, FileRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Files owned by `owner`, newest first
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list_owned(&self, owner: Uuid) -> Result<Vec<FileSummary>, AppError> {
        let files = sqlx::query_as::<Postgres, FileSummary>(
            r#"
            SELECT id, filename, preview_image
            FROM files
            WHERE owner = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Files other users shared with `user_id`, most recently shared first
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list_shared_with(&self, user_id: Uuid) -> Result<Vec<FileSummary>, AppError> {
        let files = sqlx::query_as::<Postgres, FileSummary>(
            r#"
            SELECT f.id, f.filename, f.preview_image
            FROM files f
            JOIN shared s ON s.file_id = f.id
            WHERE s.shared_with = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Case-insensitive substring match on the filename across every file
    /// `user_id` can see. An empty query matches everything.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn search(&self, user_id: Uuid, query: &str) -> Result<Vec<FileSummary>, AppError> {
        let pattern = escape_like(&query.trim().to_lowercase());

        let files = sqlx::query_as::<Postgres, FileSummary>(
            r#"
            SELECT f.id, f.filename, f.preview_image
            FROM files f
            WHERE (
                f.owner = $1
                OR EXISTS (SELECT 1 FROM shared s WHERE s.file_id = f.id AND s.shared_with = $1)
            )
            AND lower(f.filename) LIKE '%' || $2 || '%' ESCAPE '\'
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Delete a file row; share rows go with it through the foreign key.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Settle a pending preview. Rows that already left `pending` are not
    /// touched, so the result is `false` for them.
    #[tracing::instrument(skip(self, preview_image), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    pub async fn set_preview(
        &self,
        id: Uuid,
        preview_image: &str,
        status: PreviewStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET preview_image = $2, preview_status = $3
            WHERE id = $1 AND preview_status = 'pending'
            "#,
        )
        .bind(id)
        .bind(preview_image)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("report"), "report");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\tmp"), "c:\\\\tmp");
        assert_eq!(escape_like(""), "");
    }
}
