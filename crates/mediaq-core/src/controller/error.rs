//! Errors surfaced synchronously to whoever asked the controller for work.
//!
//! Failures inside a run never show up here; they end in the job row.

use crate::job_db::JobId;
use crate::submission::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("job {0} is downloading; try again once it has finished")]
    Conflict(JobId),
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job store: {0:#}")]
    Store(#[from] anyhow::Error),
}
