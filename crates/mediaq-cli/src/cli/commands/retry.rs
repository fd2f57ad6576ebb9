//! `mediaq retry <id>` – reset a finished job and download it again.

use anyhow::Result;
use mediaq_core::controller::JobController;
use mediaq_core::job_db::JobId;

use super::watch;

pub async fn run_retry(controller: &JobController, id: JobId, detach: bool) -> Result<()> {
    if detach {
        controller.requeue(id).await?;
        println!("Job {id} queued for retry");
        return Ok(());
    }

    let handle = controller.retry(id).await?;
    println!("Retrying job {id}");
    watch::follow_job(controller.db(), id, handle).await
}
