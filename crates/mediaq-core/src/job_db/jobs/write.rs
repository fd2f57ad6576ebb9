//! Job write operations: insert, partial update, retry reset, run claim, recovery.

use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite};

use crate::job_db::db::{unix_timestamp, JobDb};
use crate::job_db::types::{DownloadType, JobId, JobUpdate, INTERRUPTED_MESSAGE};

fn size_to_db(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

impl JobDb {
    /// Insert a new queued job with zero progress. Returns the new id.
    ///
    /// Only the submission path creates rows; the run protocol never does.
    pub async fn insert_job(
        &self,
        url: &str,
        download_type: DownloadType,
        option_overlay: Option<&str>,
    ) -> Result<JobId> {
        let now = unix_timestamp();

        let row_id = sqlx::query(
            r#"
            INSERT INTO jobs (
                url, download_type, status, progress, file_size,
                option_overlay, created_at, updated_at
            ) VALUES (?1, ?2, 'queued', 0, 0, ?3, ?4, ?5)
            "#,
        )
        .bind(url)
        .bind(download_type.as_str())
        .bind(option_overlay)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Apply a partial update. Always bumps `updated_at`, even for an empty field-set.
    /// Returns false if no row has this id.
    pub async fn update_job(&self, id: JobId, update: &JobUpdate) -> Result<bool> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE jobs SET updated_at = ");
        qb.push_bind(unix_timestamp());

        if let Some(status) = update.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(progress) = update.progress {
            qb.push(", progress = ").push_bind(i64::from(progress.min(100)));
        }
        if let Some(bytes) = update.file_size {
            qb.push(", file_size = ").push_bind(size_to_db(bytes));
        }
        if let Some(title) = &update.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(path) = &update.file_path {
            qb.push(", file_path = ").push_bind(path.clone());
        }
        if let Some(message) = &update.error_message {
            qb.push(", error_message = ").push_bind(message.clone());
        }

        qb.push(" WHERE id = ").push_bind(id);

        let r = qb.build().execute(&self.pool).await?;
        Ok(r.rows_affected() > 0)
    }

    /// Put a finished job back to its just-submitted shape (queued, no progress,
    /// no size, path, title or error).
    ///
    /// The status guard makes the check-and-reset atomic: a row in
    /// `downloading` is left untouched and false is returned.
    pub async fn reset_for_retry(&self, id: JobId) -> Result<bool> {
        let r = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'queued',
                progress = 0,
                file_size = 0,
                file_path = NULL,
                error_message = NULL,
                title = NULL,
                retry_pending = 1,
                updated_at = ?1
            WHERE id = ?2 AND status != 'downloading'
            "#,
        )
        .bind(unix_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected() > 0)
    }

    /// Claim a queued job for a run: `downloading`, zero progress, no error.
    ///
    /// Returns `None` (and changes nothing) if the row is not queued anymore,
    /// otherwise whether a retry asked for a forced re-download. The flag is
    /// consumed by the claim.
    pub async fn begin_run(&self, id: JobId) -> Result<Option<bool>> {
        let retry_pending: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE jobs
            SET status = 'downloading',
                progress = 0,
                error_message = NULL,
                updated_at = ?1
            WHERE id = ?2 AND status = 'queued'
            RETURNING retry_pending
            "#,
        )
        .bind(unix_timestamp())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(retry_pending) = retry_pending else {
            return Ok(None);
        };
        // A downloading row cannot be reset, so nothing sets the flag again here.
        sqlx::query("UPDATE jobs SET retry_pending = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(Some(retry_pending != 0))
    }

    /// Move a queued job to `canceled`. Returns false if the row is not queued.
    pub async fn cancel_queued(&self, id: JobId) -> Result<bool> {
        let r = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'canceled',
                updated_at = ?1
            WHERE id = ?2 AND status = 'queued'
            "#,
        )
        .bind(unix_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected() > 0)
    }

    /// Mark jobs left in `downloading` (e.g. after a crash) as failed so they
    /// can be retried. Rows written to within the last `idle_secs` seconds are
    /// left alone, since another process may still be running them.
    /// Returns the number of jobs touched.
    pub async fn recover_interrupted_jobs(&self, idle_secs: i64) -> Result<u64> {
        let now = unix_timestamp();
        let r = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'error',
                error_message = ?1,
                updated_at = ?2
            WHERE status = 'downloading' AND updated_at <= ?3
            "#,
        )
        .bind(INTERRUPTED_MESSAGE)
        .bind(now)
        .bind(now.saturating_sub(idle_secs.max(0)))
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }
}
