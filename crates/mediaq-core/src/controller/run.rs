//! The run protocol for one job: claim, probe, skip or transfer, finalize.

use std::path::PathBuf;
use tokio::sync::mpsc;

use super::{finish, hooks, JobController};
use crate::engine::EngineError;
use crate::job_db::{DownloadType, Job, JobId, JobUpdate};
use crate::options::{self, OptionOverlay, OptionParseError};

/// Hook events buffered between the engine and the persistence loop.
const HOOK_CHANNEL_CAPACITY: usize = 64;

/// Everything a run needs; taken from the row at submission or retry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub job_id: JobId,
    pub url: String,
    pub download_type: DownloadType,
    /// Remove an existing output instead of treating it as already done.
    pub force_redownload: bool,
    pub option_overlay: Option<String>,
}

impl RunRequest {
    pub fn for_job(job: &Job, force_redownload: bool) -> Self {
        Self {
            job_id: job.id,
            url: job.url.clone(),
            download_type: job.download_type,
            force_redownload,
            option_overlay: job.option_overlay.clone(),
        }
    }
}

/// Failures caught inside a run. Their text ends up in `error_message`.
#[derive(Debug, thiserror::Error)]
pub(super) enum RunError {
    #[error(transparent)]
    Options(#[from] OptionParseError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("job store: {0:#}")]
    Store(#[from] anyhow::Error),
    #[error("progress task failed: {0}")]
    Hooks(#[from] tokio::task::JoinError),
}

impl JobController {
    /// Run one job to a terminal state. Waits for the execution slot first.
    ///
    /// Nothing is returned: the outcome is only visible on the job row. A job
    /// that is no longer `queued` once the slot is acquired (canceled, or
    /// claimed by another run) is left alone. A retry that reset the row while
    /// this run was waiting makes it a forced re-download.
    pub async fn run_job(&self, req: RunRequest) {
        let job_id = req.job_id;
        let _slot = match self.slot.acquire().await {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!(job_id, error = %e, "execution slot closed");
                return;
            }
        };

        let req = match self.db.begin_run(job_id).await {
            Ok(Some(retry_pending)) => RunRequest {
                force_redownload: req.force_redownload || retry_pending,
                ..req
            },
            Ok(None) => {
                tracing::info!(job_id, "job is not queued; skipping run");
                return;
            }
            Err(e) => {
                tracing::error!(job_id, error = %e, "could not start run");
                return;
            }
        };
        tracing::info!(job_id, url = %req.url, force = req.force_redownload, "run started");

        match self.execute(&req).await {
            Ok(final_path) => finish::finish_completed(&self.db, job_id, &final_path).await,
            Err(e) => finish::finish_failed(&self.db, job_id, &e).await,
        }
    }

    /// Steps between the run-start write and finalize. Returns the final path.
    async fn execute(&self, req: &RunRequest) -> Result<PathBuf, RunError> {
        let job_id = req.job_id;
        let overlay = match &req.option_overlay {
            Some(raw) => options::parse_overlay(raw)?,
            None => OptionOverlay::default(),
        };
        // Built once: probe and transfer must see the same options.
        let opts = options::default_options(
            req.download_type,
            &self.settings.engine,
            &self.settings.download_dir,
            req.force_redownload,
        )
        .merged(&overlay);

        let probe = self.engine.probe(&req.url, &opts).await?;
        if let Some(title) = &probe.title {
            self.db
                .update_job(job_id, &JobUpdate::new().title(title.clone()))
                .await?;
        }
        let expected = probe.expected_path;

        if tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            if !req.force_redownload {
                tracing::info!(job_id, path = %expected.display(), "output already present; skipping transfer");
                return Ok(expected);
            }
            match self.engine.remove(&expected).await {
                Ok(()) => tracing::debug!(job_id, path = %expected.display(), "removed previous output"),
                Err(e) => {
                    tracing::warn!(job_id, path = %expected.display(), error = %e, "could not remove previous output")
                }
            }
        }

        let (tx, rx) = mpsc::channel(HOOK_CHANNEL_CAPACITY);
        let hooks_task = tokio::spawn(hooks::run_hook_persistence_loop(
            rx,
            self.db.clone(),
            job_id,
        ));
        let transferred = self.engine.transfer(&req.url, &opts, tx).await;
        // Wait for every hook write before the final one.
        let seen = hooks_task.await?;
        transferred?;

        Ok(seen.final_path().unwrap_or(expected))
    }
}
