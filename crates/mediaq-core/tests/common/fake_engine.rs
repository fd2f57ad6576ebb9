//! Scripted engine: replays a fixed list of hook events, optionally writes an
//! output file, optionally fails, and records what it was asked to do.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use mediaq_core::engine::{Engine, EngineError, EngineEvent, ProbeResult};
use mediaq_core::options::EngineOptions;

#[derive(Default)]
pub struct FakeEngine {
    title: Option<String>,
    expected_path: PathBuf,
    events: Vec<EngineEvent>,
    event_delay: Duration,
    output: Option<(PathBuf, Vec<u8>)>,
    failure: Option<String>,
    probe_failure: Option<String>,
    release: Option<Arc<Notify>>,

    pub probes: AtomicUsize,
    pub transfers: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub removed: Mutex<Vec<PathBuf>>,
    pub transfer_args: Mutex<Vec<Vec<String>>>,
    /// Whether the expected output existed when each transfer began.
    pub expected_existed: Mutex<Vec<bool>>,
}

impl FakeEngine {
    pub fn new(expected_path: impl Into<PathBuf>) -> Self {
        Self {
            expected_path: expected_path.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn events(mut self, events: Vec<EngineEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = delay;
        self
    }

    /// Write `bytes` to `path` when the transfer succeeds.
    pub fn writes(mut self, path: impl Into<PathBuf>, bytes: &[u8]) -> Self {
        self.output = Some((path.into(), bytes.to_vec()));
        self
    }

    /// Fail the transfer with `message` after replaying the events.
    pub fn fails(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn probe_fails(mut self, message: &str) -> Self {
        self.probe_failure = Some(message.to_string());
        self
    }

    /// Hold every transfer until `release` is notified.
    pub fn held_by(mut self, release: Arc<Notify>) -> Self {
        self.release = Some(release);
        self
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn probe(&self, _url: &str, _options: &EngineOptions) -> Result<ProbeResult, EngineError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.probe_failure {
            return Err(EngineError::Failed(message.clone()));
        }
        Ok(ProbeResult {
            title: self.title.clone(),
            expected_path: self.expected_path.clone(),
        })
    }

    async fn transfer(
        &self,
        _url: &str,
        options: &EngineOptions,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<(), EngineError> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.transfer_args.lock().unwrap().push(options.to_args());
        self.expected_existed
            .lock()
            .unwrap()
            .push(self.expected_path.exists());

        if let Some(release) = &self.release {
            release.notified().await;
        }
        for event in &self.events {
            let _ = events.send(event.clone()).await;
            if !self.event_delay.is_zero() {
                tokio::time::sleep(self.event_delay).await;
            }
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(EngineError::Failed(message.clone()));
        }
        if let Some((path, bytes)) = &self.output {
            tokio::fs::write(path, bytes).await?;
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        tokio::fs::remove_file(path).await
    }
}

pub fn progress(downloaded: u64, total: u64, filename: Option<&Path>) -> EngineEvent {
    EngineEvent::Progress {
        downloaded,
        total: Some(total),
        total_estimate: None,
        filename: filename.map(Path::to_path_buf),
    }
}
