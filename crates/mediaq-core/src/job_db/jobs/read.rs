//! Job read operations: get, list, counts.

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::job_db::db::JobDb;
use crate::job_db::types::{DownloadType, Job, JobId, JobStatus, QueuedJob};

const JOB_COLUMNS: &str = r#"
    id, url, title, status, download_type, file_size, progress,
    file_path, error_message, option_overlay, created_at, updated_at
"#;

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let status: String = row.get("status");
    let download_type: String = row.get("download_type");
    let file_size: i64 = row.get("file_size");
    let progress: i64 = row.get("progress");

    Ok(Job {
        id: row.get("id"),
        url: row.get("url"),
        title: row.get("title"),
        status: JobStatus::from_db_str(&status),
        download_type: download_type
            .parse::<DownloadType>()
            .context("stored download_type")?,
        file_size: u64::try_from(file_size).unwrap_or(0),
        progress: progress.clamp(0, 100) as u8,
        file_path: row.get("file_path"),
        error_message: row.get("error_message"),
        option_overlay: row.get("option_overlay"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl JobDb {
    /// Fetch a single job row.
    pub async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    /// List all jobs in the database, newest first.
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(job_from_row).collect()
    }

    /// All queued jobs, oldest first.
    pub async fn queued_jobs(&self) -> Result<Vec<QueuedJob>> {
        let rows = sqlx::query(
            r#"
            SELECT id, retry_pending FROM jobs
            WHERE status = 'queued'
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| QueuedJob {
                id: r.get("id"),
                retry_pending: r.get::<i64, _>("retry_pending") != 0,
            })
            .collect())
    }

    /// Total number of job rows.
    pub async fn count_jobs(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Number of rows currently in `status`.
    pub async fn count_in_status(&self, status: JobStatus) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = ?1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
