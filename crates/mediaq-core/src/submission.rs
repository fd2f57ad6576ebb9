//! Validation of new download requests.
//!
//! Everything here runs before a job row exists: a request that fails any
//! check never reaches the store or the engine.

use url::Url;

use crate::job_db::{DownloadType, UnknownDownloadType};
use crate::options::{self, OptionParseError};

/// Reasons a submission is rejected synchronously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid URL '{0}': expected an http(s) URL with a host")]
    InvalidUrl(String),
    #[error("playlist URLs are not supported: {0}")]
    PlaylistUnsupported(String),
    #[error(transparent)]
    InvalidDownloadType(#[from] UnknownDownloadType),
    #[error(transparent)]
    MalformedOptions(#[from] OptionParseError),
}

/// A request that passed validation and may be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub url: String,
    pub download_type: DownloadType,
    /// Raw engine flags, stored verbatim. Blank strings are dropped.
    pub option_overlay: Option<String>,
}

impl Submission {
    /// Validate URL, type and option string.
    pub fn new(
        url: &str,
        download_type: &str,
        option_overlay: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let url = validate_url(url)?;
        let download_type = download_type.trim().parse::<DownloadType>()?;
        let option_overlay = option_overlay
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if let Some(raw) = &option_overlay {
            options::parse_overlay(raw)?;
        }
        Ok(Self {
            url,
            download_type,
            option_overlay,
        })
    }
}

/// Checks scheme and host, then rejects playlists. Returns the trimmed URL as given.
pub fn validate_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl(raw.to_string()))?;
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    if !matches!(parsed.scheme(), "http" | "https") || !has_host {
        return Err(ValidationError::InvalidUrl(raw.to_string()));
    }
    if is_playlist_url(&parsed) {
        return Err(ValidationError::PlaylistUnsupported(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// True for URLs that name a playlist: a non-empty `list` query parameter or
/// "playlist" anywhere in the path.
pub fn is_playlist_url(url: &Url) -> bool {
    let has_list_param = url
        .query_pairs()
        .any(|(k, v)| k == "list" && !v.is_empty());
    has_list_param || url.path().contains("playlist")
}
