//! `mediaq status` – show status of all jobs.

use anyhow::Result;
use mediaq_core::job_db::{Job, JobDb, JobStatus};

use super::watch::format_size;

fn describe(job: &Job) -> String {
    let name = job.title.as_deref().unwrap_or(&job.url);
    match (job.status, &job.error_message) {
        (JobStatus::Error, Some(message)) => format!("{name} ({message})"),
        _ => name.to_string(),
    }
}

pub async fn run_status(db: &JobDb) -> Result<()> {
    let jobs = db.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs in database.");
    } else {
        println!(
            "{:<6} {:<12} {:<6} {:>5} {:>10} {}",
            "ID", "STATUS", "TYPE", "PCT", "SIZE", "TITLE"
        );
        for j in jobs {
            println!(
                "{:<6} {:<12} {:<6} {:>4}% {:>10} {}",
                j.id,
                j.status.as_str(),
                j.download_type.as_str(),
                j.progress,
                format_size(j.file_size),
                describe(&j)
            );
        }
    }
    Ok(())
}
