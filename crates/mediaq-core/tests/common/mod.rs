#![allow(dead_code)]

pub mod fake_engine;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mediaq_core::config::EngineConfig;
use mediaq_core::controller::{ControllerSettings, ExecutionSlot, JobController};
use mediaq_core::engine::Engine;
use mediaq_core::job_db::{Job, JobDb, JobId, JobStatus};

/// Controller over a fresh on-disk database in `state_dir`.
pub async fn controller(
    state_dir: &Path,
    download_dir: &Path,
    engine: Arc<dyn Engine>,
) -> JobController {
    let db = JobDb::open_at(state_dir.join("jobs.db")).await.unwrap();
    let settings = ControllerSettings {
        engine: EngineConfig::default(),
        download_dir: download_dir.to_path_buf(),
    };
    JobController::new(db, engine, settings, ExecutionSlot::new())
}

pub async fn job(controller: &JobController, id: JobId) -> Job {
    controller.db().get_job(id).await.unwrap().expect("job exists")
}

/// Poll until the job reaches `status` (5 s limit).
pub async fn wait_for_status(controller: &JobController, id: JobId, status: JobStatus) -> Job {
    for _ in 0..500 {
        let job = job(controller, id).await;
        if job.status == status {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached {status}");
}

/// The row invariants that hold at every observed state.
pub fn assert_row_invariants(job: &Job) {
    assert_eq!(
        job.file_path.is_some(),
        job.status == JobStatus::Completed,
        "file_path iff completed: {job:?}"
    );
    assert_eq!(
        job.error_message.is_some(),
        job.status == JobStatus::Error,
        "error_message iff error: {job:?}"
    );
    assert!(job.progress <= 100);
}
