//! `mediaq run` – run every queued job, oldest first.

use anyhow::Result;
use mediaq_core::controller::JobController;
use mediaq_core::job_db::JobStatus;

use super::watch;

/// A `downloading` row with no write for this long is taken as abandoned.
/// Busy runs write on every progress event; probing and post-processing are
/// the longest silent stretches.
const RECOVER_IDLE_SECS: i64 = 15 * 60;

pub async fn run_queue(controller: &JobController) -> Result<()> {
    let db = controller.db();
    let recovered = db.recover_interrupted_jobs(RECOVER_IDLE_SECS).await?;
    if recovered > 0 {
        tracing::info!("marked {} interrupted job(s) as failed", recovered);
        println!("Marked {recovered} interrupted job(s) as failed; use `mediaq retry <id>` to run them again.");
    }

    let queued = db.count_in_status(JobStatus::Queued).await?;
    if queued == 0 {
        println!("No queued jobs.");
        return Ok(());
    }
    println!("Running {queued} queued job(s)");

    let handle = controller.resume_queued().await?;
    watch::follow_queue(db, handle).await?;

    let completed = db.count_in_status(JobStatus::Completed).await?;
    let failed = db.count_in_status(JobStatus::Error).await?;
    println!("Done. {completed} completed, {failed} failed in total.");
    Ok(())
}
