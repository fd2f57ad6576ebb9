//! `mediaq add <url>` – submit a job and follow it, or just queue it.

use anyhow::Result;
use mediaq_core::controller::JobController;
use mediaq_core::job_db::DownloadType;

use super::watch;

pub async fn run_add(
    controller: &JobController,
    url: &str,
    audio: bool,
    params: Option<&str>,
    detach: bool,
) -> Result<()> {
    let download_type = if audio {
        DownloadType::Audio
    } else {
        DownloadType::Video
    };

    if detach {
        let id = controller
            .enqueue(url, download_type.as_str(), params)
            .await?;
        println!("Queued job {id} ({download_type}) for URL: {url}");
        return Ok(());
    }

    let (id, handle) = controller
        .submit(url, download_type.as_str(), params)
        .await?;
    println!("Added job {id} ({download_type}) for URL: {url}");
    watch::follow_job(controller.db(), id, handle).await
}
