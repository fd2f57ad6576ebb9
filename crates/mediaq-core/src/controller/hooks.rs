//! Progress hook persistence: one store write per engine event.

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::engine::EngineEvent;
use crate::job_db::{JobDb, JobId, JobUpdate};

/// What the hooks saw during one transfer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(super) struct HookState {
    pub(super) last_filename: Option<PathBuf>,
    pub(super) postprocessed: Option<PathBuf>,
    pub(super) progress: u8,
}

impl HookState {
    /// The post-processed path wins; otherwise the last name the transfer reported.
    pub(super) fn final_path(self) -> Option<PathBuf> {
        self.postprocessed.or(self.last_filename)
    }
}

/// `floor(downloaded * 100 / total)`, clamped to 100. `None` when `total` is 0.
pub(super) fn percent(downloaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let pct = u128::from(downloaded) * 100 / u128::from(total);
    Some(pct.min(100) as u8)
}

/// Apply one event to `state` and return the row update it implies.
pub(super) fn apply_event(state: &mut HookState, event: EngineEvent) -> JobUpdate {
    match event {
        EngineEvent::Progress {
            downloaded,
            total,
            total_estimate,
            filename,
        } => {
            if filename.is_some() {
                state.last_filename = filename;
            }
            let mut update = JobUpdate::new();
            if let Some(total) = total.or(total_estimate).filter(|t| *t > 0) {
                if let Some(pct) = percent(downloaded, total) {
                    // Fragment restarts can report fewer bytes; never go backwards.
                    state.progress = state.progress.max(pct);
                }
                update = update.progress(state.progress).file_size(total);
            }
            update
        }
        EngineEvent::PostprocessDone { path } => {
            state.postprocessed = Some(path);
            JobUpdate::new()
        }
    }
}

/// Consume hook events until the engine drops its sender, persisting each one.
/// Spawn this with `tokio::spawn`; the returned state feeds finalize.
pub(super) async fn run_hook_persistence_loop(
    mut events: mpsc::Receiver<EngineEvent>,
    db: JobDb,
    job_id: JobId,
) -> HookState {
    let mut state = HookState::default();
    while let Some(event) = events.recv().await {
        let update = apply_event(&mut state, event);
        if let Err(e) = db.update_job(job_id, &update).await {
            tracing::warn!(job_id, error = %e, "progress update failed");
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(downloaded: u64, total: Option<u64>, name: Option<&str>) -> EngineEvent {
        EngineEvent::Progress {
            downloaded,
            total,
            total_estimate: None,
            filename: name.map(PathBuf::from),
        }
    }

    #[test]
    fn percent_floors_and_clamps() {
        assert_eq!(percent(0, 1000), Some(0));
        assert_eq!(percent(999, 1000), Some(99));
        assert_eq!(percent(1000, 1000), Some(100));
        assert_eq!(percent(1500, 1000), Some(100));
        assert_eq!(percent(5, 0), None);
        assert_eq!(percent(u64::MAX, u64::MAX), Some(100));
    }

    #[test]
    fn progress_never_decreases_within_a_run() {
        let mut state = HookState::default();
        let up = apply_event(&mut state, progress(600, Some(1000), None));
        assert_eq!(up.progress, Some(60));
        assert_eq!(up.file_size, Some(1000));

        let up = apply_event(&mut state, progress(100, Some(1000), None));
        assert_eq!(up.progress, Some(60));
        assert_eq!(state.progress, 60);
    }

    #[test]
    fn unknown_total_leaves_progress_untouched() {
        let mut state = HookState::default();
        apply_event(&mut state, progress(500, Some(1000), None));
        let up = apply_event(&mut state, progress(700, None, None));
        assert_eq!(up.progress, None);
        assert_eq!(up.file_size, None);
        assert!(up.is_empty());
        assert_eq!(state.progress, 50);
    }

    #[test]
    fn estimate_is_used_when_total_is_missing() {
        let mut state = HookState::default();
        let up = apply_event(
            &mut state,
            EngineEvent::Progress {
                downloaded: 250,
                total: None,
                total_estimate: Some(1000),
                filename: None,
            },
        );
        assert_eq!(up.progress, Some(25));
        assert_eq!(up.file_size, Some(1000));
    }

    #[test]
    fn final_path_prefers_postprocessed_then_last_filename() {
        let mut state = HookState::default();
        apply_event(&mut state, progress(1, Some(2), Some("/dl/a.f1.webm")));
        apply_event(&mut state, progress(2, Some(2), Some("/dl/a.webm")));
        apply_event(&mut state, progress(2, Some(2), None));
        assert_eq!(state.clone().final_path(), Some(PathBuf::from("/dl/a.webm")));

        apply_event(
            &mut state,
            EngineEvent::PostprocessDone {
                path: PathBuf::from("/dl/a.mp3"),
            },
        );
        assert_eq!(state.final_path(), Some(PathBuf::from("/dl/a.mp3")));
        assert_eq!(HookState::default().final_path(), None);
    }
}
