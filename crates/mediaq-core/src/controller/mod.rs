//! Job controller: the only writer of a job row once it leaves `queued`.
//!
//! Submission and retry are answered synchronously (validation, conflict,
//! not-found); the run itself happens on a spawned task that waits for the
//! controller's [`ExecutionSlot`], so at most one job is `downloading` at a time.

mod error;
mod finish;
mod hooks;
mod run;
mod slot;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use error::ControllerError;
pub use finish::MAX_ERROR_MESSAGE_CHARS;
pub use run::RunRequest;
pub use slot::{ExecutionSlot, SlotGuard};

use crate::config::{EngineConfig, MediaqConfig};
use crate::engine::Engine;
use crate::job_db::{Job, JobDb, JobId};
use crate::submission::Submission;

/// Inputs to the per-type default options.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub engine: EngineConfig,
    pub download_dir: PathBuf,
}

impl ControllerSettings {
    pub fn from_config(cfg: &MediaqConfig) -> anyhow::Result<Self> {
        Ok(Self {
            engine: cfg.engine.clone(),
            download_dir: cfg.resolved_download_dir()?,
        })
    }
}

/// Cheap to clone; clones share the store, engine and execution slot.
#[derive(Clone)]
pub struct JobController {
    db: JobDb,
    engine: Arc<dyn Engine>,
    settings: Arc<ControllerSettings>,
    slot: ExecutionSlot,
}

impl JobController {
    pub fn new(
        db: JobDb,
        engine: Arc<dyn Engine>,
        settings: ControllerSettings,
        slot: ExecutionSlot,
    ) -> Self {
        Self {
            db,
            engine,
            settings: Arc::new(settings),
            slot,
        }
    }

    pub fn db(&self) -> &JobDb {
        &self.db
    }

    /// Validate and insert a job without starting it.
    pub async fn enqueue(
        &self,
        url: &str,
        download_type: &str,
        option_overlay: Option<&str>,
    ) -> Result<JobId, ControllerError> {
        let submission = Submission::new(url, download_type, option_overlay)?;
        let job_id = self
            .db
            .insert_job(
                &submission.url,
                submission.download_type,
                submission.option_overlay.as_deref(),
            )
            .await?;
        tracing::info!(job_id, url = %submission.url, download_type = %submission.download_type, "job queued");
        Ok(job_id)
    }

    /// Validate, insert and start a job. Returns as soon as the run is spawned.
    pub async fn submit(
        &self,
        url: &str,
        download_type: &str,
        option_overlay: Option<&str>,
    ) -> Result<(JobId, JoinHandle<()>), ControllerError> {
        let job_id = self.enqueue(url, download_type, option_overlay).await?;
        let job = self.fetch(job_id).await?;
        Ok((job_id, self.spawn_run(RunRequest::for_job(&job, false))))
    }

    /// Reset a finished job to its just-submitted state without starting it.
    /// The reset row remembers that its next run must re-download.
    pub async fn requeue(&self, job_id: JobId) -> Result<Job, ControllerError> {
        self.fetch(job_id).await?;
        if !self.db.reset_for_retry(job_id).await? {
            return Err(ControllerError::Conflict(job_id));
        }
        tracing::info!(job_id, "job reset for retry");
        self.fetch(job_id).await
    }

    /// Reset a finished job and start a forced re-download with its stored overlay.
    pub async fn retry(&self, job_id: JobId) -> Result<JoinHandle<()>, ControllerError> {
        let job = self.requeue(job_id).await?;
        Ok(self.spawn_run(RunRequest::for_job(&job, true)))
    }

    /// Cancel a job that has not started. Running and finished jobs are a conflict.
    pub async fn cancel(&self, job_id: JobId) -> Result<(), ControllerError> {
        self.fetch(job_id).await?;
        if !self.db.cancel_queued(job_id).await? {
            return Err(ControllerError::Conflict(job_id));
        }
        tracing::info!(job_id, "job canceled");
        Ok(())
    }

    /// Start a run in the background and return immediately.
    pub fn spawn_run(&self, req: RunRequest) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move { controller.run_job(req).await })
    }

    /// Run every queued job, oldest first, one after another, on a background task.
    /// Jobs reset by a retry are re-downloaded.
    pub async fn resume_queued(&self) -> Result<JoinHandle<()>, ControllerError> {
        let queued = self.db.queued_jobs().await?;
        let mut requests = Vec::with_capacity(queued.len());
        for q in queued {
            if let Some(job) = self.db.get_job(q.id).await? {
                requests.push(RunRequest::for_job(&job, q.retry_pending));
            }
        }
        tracing::info!(count = requests.len(), "resuming queued jobs");

        let controller = self.clone();
        Ok(tokio::spawn(async move {
            for req in requests {
                controller.run_job(req).await;
            }
        }))
    }

    async fn fetch(&self, job_id: JobId) -> Result<Job, ControllerError> {
        self.db
            .get_job(job_id)
            .await?
            .ok_or(ControllerError::NotFound(job_id))
    }
}
