//! Parsers for yt-dlp output

use crate::progress::RawProgress;
use crate::types::VideoMetadata;
use serde::Deserialize;

/// Prefix that marks a machine-readable progress line on stdout
///
/// Passed to yt-dlp through `--progress-template` so progress can be told
/// apart from anything else the binary prints.
pub const PROGRESS_MARKER: &str = "media-dl-progress ";

/// Fields of `--dump-single-json` output that are kept
#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    duration: Option<serde_json::Value>,
    uploader: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
}

/// Parse the JSON document printed by `yt-dlp --dump-single-json`
///
/// # Errors
///
/// [`Error::Resolution`](crate::Error::Resolution) if the document is not
/// JSON or has no title.
pub fn parse_metadata_json(stdout: &[u8]) -> crate::Result<VideoMetadata> {
    let info: InfoJson = serde_json::from_slice(stdout).map_err(|e| {
        crate::Error::Resolution(format!("could not parse extractor metadata: {}", e))
    })?;

    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| crate::Error::Resolution("extractor metadata has no title".into()))?;

    // live streams report no duration, some extractors report it as a string
    let duration = info.duration.and_then(|d| match d {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    Ok(VideoMetadata {
        title,
        duration: duration.filter(|d: &f64| d.is_finite()),
        author: info.uploader,
        description: info.description,
        thumbnail: info.thumbnail,
    })
}

/// Result of looking at one stdout line
#[derive(Debug, PartialEq)]
pub enum ProgressLine {
    /// A well-formed progress record
    Record(RawProgress),
    /// A marked line whose payload could not be decoded
    Malformed(String),
    /// Not a progress line
    Other,
}

/// Parse a single line of download output
pub fn parse_progress_line(line: &str) -> ProgressLine {
    let Some(payload) = line.trim_end().strip_prefix(PROGRESS_MARKER) else {
        return ProgressLine::Other;
    };

    match serde_json::from_str::<RawProgress>(payload) {
        Ok(record) => ProgressLine::Record(record),
        Err(e) => ProgressLine::Malformed(format!("unreadable progress record: {}", e)),
    }
}

/// Best error message in yt-dlp's stderr
///
/// The last `ERROR:` line wins; otherwise the last non-empty line. `None` if
/// stderr is empty.
pub fn extract_error_message(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
}
