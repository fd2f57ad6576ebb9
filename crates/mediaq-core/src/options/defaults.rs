//! Per-type default engine options.

use std::path::Path;

use super::EngineOptions;
use crate::config::EngineConfig;
use crate::job_db::DownloadType;

/// Baseline options for one run. Built once per run and reused for both
/// probe and transfer so the expected path matches what the transfer writes.
pub fn default_options(
    download_type: DownloadType,
    cfg: &EngineConfig,
    download_dir: &Path,
    force_overwrites: bool,
) -> EngineOptions {
    let mut opts = EngineOptions::new();
    opts.switch("no_playlist", true)
        .switch("no_warnings", true)
        .switch("no_cache_dir", true)
        .switch("no_mtime", true)
        .switch("force_overwrites", force_overwrites)
        .value("user_agent", cfg.user_agent.clone())
        .value("paths", download_dir.to_string_lossy())
        .value("output", cfg.output_template.clone());
    for header in &cfg.extra_headers {
        opts.push("add_header", header.clone());
    }

    if download_type == DownloadType::Audio {
        opts.value("format", "bestaudio/best")
            .switch("extract_audio", true)
            .value("audio_format", cfg.audio_format.clone())
            .value("audio_quality", cfg.audio_quality.clone());
    }
    opts
}
