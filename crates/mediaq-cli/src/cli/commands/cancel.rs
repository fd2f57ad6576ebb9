//! `mediaq cancel <id>` – cancel a job that is still queued.

use anyhow::Result;
use mediaq_core::controller::JobController;
use mediaq_core::job_db::JobId;

pub async fn run_cancel(controller: &JobController, id: JobId) -> Result<()> {
    controller.cancel(id).await?;
    println!("Canceled job {id}");
    Ok(())
}
