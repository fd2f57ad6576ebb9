//! Extraction engine boundary.
//!
//! The controller never talks to yt-dlp directly: it calls [`Engine::probe`]
//! for metadata and the would-be output path, then [`Engine::transfer`] with
//! a channel that receives [`EngineEvent`]s in the order the engine emits them.

mod ytdlp;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::options::EngineOptions;

pub use ytdlp::YtDlpEngine;

/// Metadata returned by a probe (no media bytes transferred).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub title: Option<String>,
    /// Where the transfer would write before any post-processing.
    pub expected_path: PathBuf,
}

/// Hook events raised while a transfer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Bytes moved so far. `total` is exact when known; `total_estimate` is
    /// the engine's guess when it is not.
    Progress {
        downloaded: u64,
        total: Option<u64>,
        total_estimate: Option<u64>,
        filename: Option<PathBuf>,
    },
    /// A post-processing step (e.g. audio extraction) produced the final file.
    PostprocessDone { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The engine ran and reported failure; the message is its own.
    #[error("{0}")]
    Failed(String),
    #[error("unreadable probe output: {0}")]
    Probe(String),
    #[error("engine I/O: {0}")]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Resolve title and expected output path without downloading.
    async fn probe(&self, url: &str, options: &EngineOptions) -> Result<ProbeResult, EngineError>;

    /// Download (and post-process) `url`, sending hook events on `events`.
    /// Returns once the engine is done; the sender is dropped on return.
    async fn transfer(
        &self,
        url: &str,
        options: &EngineOptions,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<(), EngineError>;

    /// Delete a previous output. Callers treat failure as non-fatal.
    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
