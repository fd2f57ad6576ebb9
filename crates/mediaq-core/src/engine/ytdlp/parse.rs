//! Parse yt-dlp output: probe JSON, progress-template lines and failure text.

use serde::Deserialize;
use std::path::PathBuf;

use super::super::{EngineError, EngineEvent, ProbeResult};

pub(super) const PROGRESS_PREFIX: &str = "MEDIAQ_PROGRESS|";
pub(super) const OUTPUT_PREFIX: &str = "MEDIAQ_OUTPUT|";

/// `--progress-template` value. The filename goes last since it may contain `|`.
pub(super) fn progress_template() -> String {
    format!(
        "download:{PROGRESS_PREFIX}%(progress.downloaded_bytes)s|%(progress.total_bytes)s|\
         %(progress.total_bytes_estimate)s|%(progress.filename)s"
    )
}

/// `--print` value emitting the final path once every post-processor has run.
pub(super) fn output_template() -> String {
    format!("after_move:{OUTPUT_PREFIX}%(filepath)s")
}

#[derive(Debug, Deserialize)]
struct ProbeInfo {
    title: Option<String>,
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
}

/// Parse `--dump-single-json` output.
pub(super) fn parse_probe(stdout: &[u8]) -> Result<ProbeResult, EngineError> {
    let info: ProbeInfo =
        serde_json::from_slice(stdout).map_err(|e| EngineError::Probe(e.to_string()))?;
    let expected = info
        .filename
        .or(info.legacy_filename)
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| EngineError::Probe("no output filename in probe result".to_string()))?;
    Ok(ProbeResult {
        title: info.title.filter(|t| !t.trim().is_empty()),
        expected_path: PathBuf::from(expected),
    })
}

/// yt-dlp prints `NA` (or Python's `None`) for fields it does not know.
/// Byte counts may come as floats for estimates.
fn parse_count(field: &str) -> Option<u64> {
    let field = field.trim();
    if field.is_empty() || field == "NA" || field == "None" {
        return None;
    }
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    match field.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f as u64),
        _ => None,
    }
}

fn parse_path(field: &str) -> Option<PathBuf> {
    let field = field.trim();
    if field.is_empty() || field == "NA" || field == "None" {
        None
    } else {
        Some(PathBuf::from(field))
    }
}

/// Turn one output line into a hook event. Lines that are not ours return `None`.
pub(super) fn parse_line(line: &str) -> Option<EngineEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix(OUTPUT_PREFIX) {
        return parse_path(rest).map(|path| EngineEvent::PostprocessDone { path });
    }
    let rest = line.strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.splitn(4, '|');
    let downloaded = parse_count(fields.next()?)?;
    let total = fields.next().and_then(parse_count);
    let total_estimate = fields.next().and_then(parse_count);
    let filename = fields.next().and_then(parse_path);
    Some(EngineEvent::Progress {
        downloaded,
        total,
        total_estimate,
        filename,
    })
}

/// Remembers what the engine said last, to explain a non-zero exit.
#[derive(Debug, Default)]
pub(super) struct FailureTail {
    last_error: Option<String>,
    last_line: Option<String>,
}

impl FailureTail {
    pub(super) fn record(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with(PROGRESS_PREFIX) || line.starts_with(OUTPUT_PREFIX)
        {
            return;
        }
        if line.starts_with("ERROR:") {
            self.last_error = Some(line.to_string());
        }
        self.last_line = Some(line.to_string());
    }

    /// `ERROR:` lines win over whatever was printed last.
    pub(super) fn into_message(self) -> Option<String> {
        self.last_error.or(self.last_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_with_known_total() {
        assert_eq!(
            parse_line("MEDIAQ_PROGRESS|2048|4096|NA|/dl/clip [abc].f137.mp4"),
            Some(EngineEvent::Progress {
                downloaded: 2048,
                total: Some(4096),
                total_estimate: None,
                filename: Some(PathBuf::from("/dl/clip [abc].f137.mp4")),
            })
        );
    }

    #[test]
    fn progress_line_with_estimate_only() {
        assert_eq!(
            parse_line("MEDIAQ_PROGRESS|10|NA|12345.6|None\r\n"),
            Some(EngineEvent::Progress {
                downloaded: 10,
                total: None,
                total_estimate: Some(12345),
                filename: None,
            })
        );
    }

    #[test]
    fn filename_may_contain_separator() {
        match parse_line("MEDIAQ_PROGRESS|1|2|NA|/dl/a|b.webm") {
            Some(EngineEvent::Progress { filename, .. }) => {
                assert_eq!(filename, Some(PathBuf::from("/dl/a|b.webm")))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn output_line_is_postprocess_path() {
        assert_eq!(
            parse_line("MEDIAQ_OUTPUT|/dl/song [x].mp3"),
            Some(EngineEvent::PostprocessDone {
                path: PathBuf::from("/dl/song [x].mp3")
            })
        );
        assert_eq!(parse_line("MEDIAQ_OUTPUT|"), None);
    }

    #[test]
    fn unrelated_and_garbled_lines_are_ignored() {
        assert_eq!(parse_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_line("MEDIAQ_PROGRESS|NA|100|NA|x"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn probe_prefers_filename_field() {
        let json = br#"{"id":"abc","title":"Clip","filename":"/dl/Clip [abc].webm","_filename":"/old"}"#;
        let probe = parse_probe(json).unwrap();
        assert_eq!(probe.title.as_deref(), Some("Clip"));
        assert_eq!(probe.expected_path, PathBuf::from("/dl/Clip [abc].webm"));
    }

    #[test]
    fn probe_falls_back_to_legacy_filename() {
        let probe = parse_probe(br#"{"title":"","_filename":"/dl/x.mp4"}"#).unwrap();
        assert!(probe.title.is_none());
        assert_eq!(probe.expected_path, PathBuf::from("/dl/x.mp4"));
    }

    #[test]
    fn probe_without_filename_or_json_fails() {
        assert!(matches!(
            parse_probe(br#"{"title":"x"}"#),
            Err(EngineError::Probe(_))
        ));
        assert!(matches!(parse_probe(b"not json"), Err(EngineError::Probe(_))));
    }

    #[test]
    fn failure_tail_prefers_error_lines() {
        let mut tail = FailureTail::default();
        tail.record("ERROR: [youtube] abc: Video unavailable");
        tail.record("MEDIAQ_PROGRESS|1|2|NA|x");
        tail.record("some trailing noise");
        assert_eq!(
            tail.into_message().as_deref(),
            Some("ERROR: [youtube] abc: Video unavailable")
        );

        let mut tail = FailureTail::default();
        tail.record("  ");
        assert_eq!(tail.into_message(), None);
    }
}
