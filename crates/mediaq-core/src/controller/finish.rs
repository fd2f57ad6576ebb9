//! Final write of a run: completed with the real path and size, or error with a message.

use std::path::Path;

use super::run::RunError;
use crate::job_db::{JobDb, JobId, JobStatus, JobUpdate};

/// Longest error message stored on a row, in characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

const FALLBACK_MESSAGE: &str = "download failed";

/// Trim and cut `message` to [`MAX_ERROR_MESSAGE_CHARS`]. Never returns an empty string.
pub(super) fn error_message_for(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return FALLBACK_MESSAGE.to_string();
    }
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}

/// Size of the finished file, 0 if it cannot be stat-ed.
async fn size_on_disk(path: &Path) -> u64 {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "stat of final path failed");
            0
        }
    }
}

/// Mark the job completed at `final_path`.
pub(super) async fn finish_completed(db: &JobDb, job_id: JobId, final_path: &Path) {
    let file_size = size_on_disk(final_path).await;
    let update = JobUpdate::new()
        .status(JobStatus::Completed)
        .file_path(final_path.to_string_lossy())
        .file_size(file_size)
        .progress(100)
        .clear_error_message();
    match db.update_job(job_id, &update).await {
        Ok(_) => tracing::info!(job_id, path = %final_path.display(), file_size, "job completed"),
        Err(e) => tracing::error!(job_id, error = %e, "could not record completion"),
    }
}

/// Mark the job failed. Progress, size and path stay as last written.
pub(super) async fn finish_failed(db: &JobDb, job_id: JobId, err: &RunError) {
    let message = error_message_for(&err.to_string());
    let update = JobUpdate::new()
        .status(JobStatus::Error)
        .error_message(message.clone());
    match db.update_job(job_id, &update).await {
        Ok(_) => tracing::warn!(job_id, error = %message, "job failed"),
        Err(e) => tracing::error!(job_id, error = %e, "could not record failure"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_is_bounded_and_never_empty() {
        assert_eq!(error_message_for("  "), FALLBACK_MESSAGE);
        assert_eq!(error_message_for(" boom \n"), "boom");

        let long = "é".repeat(MAX_ERROR_MESSAGE_CHARS + 20);
        let cut = error_message_for(&long);
        assert_eq!(cut.chars().count(), MAX_ERROR_MESSAGE_CHARS);
    }
}
