//! Follow running jobs by polling their rows.

use anyhow::{bail, Context, Result};
use mediaq_core::job_db::{Job, JobDb, JobId, JobStatus};
use std::time::Duration;
use tokio::task::JoinHandle;

const POLL_INTERVAL_MS: u64 = 500;

pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "-".to_string();
    }
    let mib = bytes as f64 / 1_048_576.0;
    if mib >= 1.0 {
        format!("{mib:.1} MiB")
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

fn progress_line(job: &Job) -> String {
    let name = job.title.as_deref().unwrap_or(&job.url);
    format!(
        "  job {}: {:>3}%  {}  {}",
        job.id,
        job.progress,
        format_size(job.file_size),
        name
    )
}

/// Print one line per visible change until the run finishes, then report the outcome.
/// A failed job is returned as an error so the process exits non-zero.
pub async fn follow_job(db: &JobDb, id: JobId, handle: JoinHandle<()>) -> Result<()> {
    let mut last: Option<(JobStatus, u8)> = None;
    while !handle.is_finished() {
        if let Some(job) = db.get_job(id).await? {
            let seen = (job.status, job.progress);
            if job.status == JobStatus::Downloading && last != Some(seen) {
                println!("{}", progress_line(&job));
            }
            last = Some(seen);
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
    handle.await.context("download task")?;

    let job = db
        .get_job(id)
        .await?
        .with_context(|| format!("job {id} disappeared"))?;
    report(&job)
}

/// Follow a drain of the queue: show whichever job is downloading.
pub async fn follow_queue(db: &JobDb, handle: JoinHandle<()>) -> Result<()> {
    let mut last: Option<(JobId, u8)> = None;
    while !handle.is_finished() {
        let current = db
            .list_jobs()
            .await?
            .into_iter()
            .find(|j| j.status == JobStatus::Downloading);
        if let Some(job) = current {
            if last != Some((job.id, job.progress)) {
                println!("{}", progress_line(&job));
                last = Some((job.id, job.progress));
            }
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
    handle.await.context("queue task")?;
    Ok(())
}

fn report(job: &Job) -> Result<()> {
    match job.status {
        JobStatus::Completed => {
            println!(
                "Job {} completed: {} ({})",
                job.id,
                job.file_path.as_deref().unwrap_or("-"),
                format_size(job.file_size)
            );
            Ok(())
        }
        JobStatus::Error => bail!(
            "job {} failed: {}",
            job.id,
            job.error_message.as_deref().unwrap_or("unknown error")
        ),
        other => {
            println!("Job {} is {}", job.id, other);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(0), "-");
        assert_eq!(format_size(512), "0.5 KiB");
        assert_eq!(format_size(3 * 1_048_576 + 524_288), "3.5 MiB");
    }
}
