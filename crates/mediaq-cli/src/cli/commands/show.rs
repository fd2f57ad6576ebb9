//! `mediaq show <id>` – print one job as JSON.

use anyhow::{Context, Result};
use mediaq_core::job_db::{JobDb, JobId};

pub async fn run_show(db: &JobDb, id: JobId) -> Result<()> {
    let job = db
        .get_job(id)
        .await?
        .with_context(|| format!("job {id} not found"))?;
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}
