//! yt-dlp as a subprocess.
//!
//! Probe runs `--dump-single-json --skip-download` and reads the JSON info
//! dict. Transfer asks yt-dlp for machine-readable progress lines through
//! `--progress-template` and for the post-processed path through
//! `--print after_move:`; both streams are read line by line and turned into
//! [`EngineEvent`]s.

mod parse;

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{Engine, EngineError, EngineEvent, ProbeResult};
use crate::config::EngineConfig;
use crate::options::EngineOptions;

#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: String,
    leading_args: Vec<String>,
}

impl YtDlpEngine {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self::with_command(cfg.binary.clone(), cfg.binary_args.clone())
    }

    /// `program` is run with `leading_args` ahead of the generated arguments.
    pub fn with_command(program: impl Into<String>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }

    fn command(&self, options: &EngineOptions) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(options.to_args())
            .env("PYTHONIOENCODING", "UTF-8")
            .env("PYTHONUTF8", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> EngineError {
        EngineError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

/// Take the buffered line, decoding lossily; yt-dlp output is not always UTF-8.
fn take_line(buf: &mut Vec<u8>) -> String {
    let line = String::from_utf8_lossy(buf).trim_end().to_string();
    buf.clear();
    line
}

#[async_trait]
impl Engine for YtDlpEngine {
    async fn probe(&self, url: &str, options: &EngineOptions) -> Result<ProbeResult, EngineError> {
        let output = self
            .command(options)
            .args(["--dump-single-json", "--skip-download", "--"])
            .arg(url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let mut tail = parse::FailureTail::default();
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                tail.record(line);
            }
            let message = tail
                .into_message()
                .unwrap_or_else(|| format!("probe exited with {}", output.status));
            return Err(EngineError::Failed(message));
        }
        parse::parse_probe(&output.stdout)
    }

    async fn transfer(
        &self,
        url: &str,
        options: &EngineOptions,
        events: mpsc::Sender<EngineEvent>,
    ) -> Result<(), EngineError> {
        let mut child = self
            .command(options)
            .args(["--newline", "--progress", "--progress-template"])
            .arg(parse::progress_template())
            .arg("--print")
            .arg(parse::output_template())
            .arg("--")
            .arg(url)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Failed("engine stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Failed("engine stderr was not captured".to_string()))?;
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
        let (mut out_open, mut err_open) = (true, true);
        let mut tail = parse::FailureTail::default();

        // Builds differ in which stream carries progress, so both are parsed.
        while out_open || err_open {
            let line = tokio::select! {
                read = stdout.read_until(b'\n', &mut out_buf), if out_open => {
                    if read? == 0 {
                        out_open = false;
                        continue;
                    }
                    take_line(&mut out_buf)
                }
                read = stderr.read_until(b'\n', &mut err_buf), if err_open => {
                    if read? == 0 {
                        err_open = false;
                        continue;
                    }
                    take_line(&mut err_buf)
                }
            };

            match parse::parse_line(&line) {
                Some(event) => {
                    // A gone receiver only means nobody is listening anymore.
                    let _ = events.send(event).await;
                }
                None => {
                    tracing::trace!(line = %line, "engine output");
                    tail.record(&line);
                }
            }
        }

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            let message = tail
                .into_message()
                .unwrap_or_else(|| format!("engine exited with {status}"));
            Err(EngineError::Failed(message))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn script_engine(dir: &Path, body: &str) -> YtDlpEngine {
        let script = dir.join("fake-ytdlp.sh");
        std::fs::write(&script, body).unwrap();
        YtDlpEngine::with_command("sh", vec![script.to_string_lossy().into_owned()])
    }

    #[tokio::test]
    async fn probe_reads_json_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let engine = script_engine(
            dir.path(),
            r#"echo '{"title":"Clip","filename":"/dl/Clip [abc].webm"}'"#,
        );
        let probe = engine
            .probe("https://example.com/v", &EngineOptions::new())
            .await
            .unwrap();
        assert_eq!(probe.title.as_deref(), Some("Clip"));
        assert_eq!(probe.expected_path, PathBuf::from("/dl/Clip [abc].webm"));
    }

    #[tokio::test]
    async fn probe_failure_carries_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = script_engine(
            dir.path(),
            "echo 'ERROR: [generic] Unsupported URL' >&2\nexit 1\n",
        );
        let err = engine
            .probe("https://example.com/v", &EngineOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ERROR: [generic] Unsupported URL");
    }

    #[tokio::test]
    async fn transfer_forwards_events_from_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let engine = script_engine(
            dir.path(),
            "echo '[youtube] abc: Downloading webpage'\n\
             echo 'MEDIAQ_PROGRESS|500|1000|NA|/dl/a.webm'\n\
             echo 'MEDIAQ_PROGRESS|1000|1000|NA|/dl/a.webm' >&2\n\
             echo 'MEDIAQ_OUTPUT|/dl/a.mp3'\n",
        );
        let (tx, mut rx) = mpsc::channel(16);
        engine
            .transfer("https://example.com/v", &EngineOptions::new(), tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        assert_eq!(events.len(), 3);
        assert!(events.contains(&EngineEvent::PostprocessDone {
            path: PathBuf::from("/dl/a.mp3")
        }));
        assert!(events.contains(&EngineEvent::Progress {
            downloaded: 1000,
            total: Some(1000),
            total_estimate: None,
            filename: Some(PathBuf::from("/dl/a.webm")),
        }));
    }

    #[tokio::test]
    async fn transfer_failure_prefers_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = script_engine(
            dir.path(),
            "echo 'MEDIAQ_PROGRESS|10|100|NA|/dl/a.webm'\n\
             echo 'ERROR: unable to download video data: HTTP Error 403' >&2\n\
             echo 'cleanup' >&2\n\
             exit 1\n",
        );
        let (tx, _rx) = mpsc::channel(16);
        let err = engine
            .transfer("https://example.com/v", &EngineOptions::new(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Failed(_)));
        assert_eq!(
            err.to_string(),
            "ERROR: unable to download video data: HTTP Error 403"
        );
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let engine = YtDlpEngine::with_command("/nonexistent/mediaq-engine", Vec::new());
        let (tx, _rx) = mpsc::channel(1);
        let err = engine
            .transfer("https://example.com/v", &EngineOptions::new(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }
}
