//! CLI for the mediaq download queue.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mediaq_core::config;
use mediaq_core::controller::{ControllerSettings, ExecutionSlot, JobController};
use mediaq_core::engine::YtDlpEngine;
use mediaq_core::job_db::{JobDb, JobId};
use std::sync::Arc;

use commands::{
    run_add, run_cancel, run_completions, run_queue, run_retry, run_show, run_status,
};

/// Top-level CLI for the mediaq download queue.
#[derive(Debug, Parser)]
#[command(name = "mediaq")]
#[command(about = "mediaq: single-worker media download queue driven by yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add a download job and run it (or only queue it with --detach).
    Add {
        /// Video page URL (http or https). Playlists are rejected.
        url: String,
        /// Extract audio instead of keeping the video.
        #[arg(long)]
        audio: bool,
        /// Extra yt-dlp flags, e.g. "--format 'bv*+ba' --embed-thumbnail".
        #[arg(long, value_name = "FLAGS", allow_hyphen_values = true)]
        params: Option<String>,
        /// Only queue the job; `mediaq run` picks it up later.
        #[arg(long)]
        detach: bool,
    },

    /// Reset a finished job and download it again, replacing any existing file.
    Retry {
        /// Job identifier.
        id: JobId,
        /// Only reset the job; `mediaq run` picks it up later.
        #[arg(long)]
        detach: bool,
    },

    /// Run every queued job, oldest first, one at a time.
    ///
    /// Jobs left downloading with no progress for 15 minutes are first marked
    /// as failed. Do not start `run` while another mediaq process is
    /// downloading: runs in separate processes are not serialized.
    Run,

    /// Show status of all jobs.
    Status,

    /// Print one job as JSON.
    Show {
        /// Job identifier.
        id: JobId,
    },

    /// Cancel a job that has not started yet.
    Cancel {
        /// Job identifier.
        id: JobId,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },
}

async fn open_db(cfg: &config::MediaqConfig) -> Result<JobDb> {
    match &cfg.database_path {
        Some(path) => JobDb::open_at(path).await,
        None => JobDb::open_default().await,
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let db = open_db(&cfg).await?;
        let engine = Arc::new(YtDlpEngine::new(&cfg.engine));
        let settings = ControllerSettings::from_config(&cfg)?;
        let controller = JobController::new(db, engine, settings, ExecutionSlot::new());

        match cli.command {
            CliCommand::Add {
                url,
                audio,
                params,
                detach,
            } => run_add(&controller, &url, audio, params.as_deref(), detach).await?,
            CliCommand::Retry { id, detach } => run_retry(&controller, id, detach).await?,
            CliCommand::Run => run_queue(&controller).await?,
            CliCommand::Status => run_status(controller.db()).await?,
            CliCommand::Show { id } => run_show(controller.db(), id).await?,
            CliCommand::Cancel { id } => run_cancel(&controller, id).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}
