//! Progress normalization
//!
//! Progress records come straight from the extractor and are not trusted:
//! numeric fields may arrive as numbers, as strings, or as strings wrapped in
//! terminal color codes. Everything here degrades to `0.0` instead of failing,
//! because progress is advisory and must never fail a download that is
//! otherwise succeeding. Each degradation is reported back to the caller as a
//! diagnostic string so it can be routed to the event bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Terminal escape sequences such as `\x1b[0;94m`
static ANSI_ESCAPE: LazyLock<regex::Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    regex::Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ANSI escape pattern is valid")
});

/// Lifecycle tag of a raw progress record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Bytes are still arriving
    Downloading,
    /// The extractor finished writing the file
    Finished,
    /// Any other tag the extractor emits (e.g. "error")
    #[serde(untagged)]
    Other(String),
}

/// A progress record exactly as the extractor reported it
///
/// Numeric fields are kept as raw JSON values; see [`ProgressSample::from_raw`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawProgress {
    /// Record tag
    pub status: ProgressStatus,
    /// Bytes written so far
    #[serde(default)]
    pub downloaded_bytes: Option<Value>,
    /// Exact total size, when the server announced one
    #[serde(default)]
    pub total_bytes: Option<Value>,
    /// Estimated total size (fragmented streams)
    #[serde(default)]
    pub total_bytes_estimate: Option<Value>,
    /// File the extractor is writing
    #[serde(default)]
    pub filename: Option<String>,
}

impl RawProgress {
    /// A `downloading` record with the given byte fields
    pub fn downloading(downloaded: impl Into<Value>, total: impl Into<Value>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(downloaded.into()),
            total_bytes: Some(total.into()),
            total_bytes_estimate: None,
            filename: None,
        }
    }

    /// A `finished` record
    pub fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            filename: None,
        }
    }
}

/// Result of normalizing one field
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    /// Clean value (`0.0` when the input was unusable)
    pub value: f64,
    /// Why the input was unusable, if it was
    pub issue: Option<String>,
}

impl Normalized {
    fn clean(value: f64) -> Self {
        Self { value, issue: None }
    }

    fn degraded(issue: String) -> Self {
        Self {
            value: 0.0,
            issue: Some(issue),
        }
    }
}

/// Remove terminal escape sequences and surrounding whitespace
pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").trim().to_string()
}

/// Convert one raw progress field into a finite `f64`
///
/// - numbers are taken as-is
/// - strings are stripped of escape sequences and whitespace, then parsed
/// - `null` means "not reported" and yields `0.0` silently
/// - anything else, unparseable text, and non-finite results yield `0.0`
///   together with an issue description
pub fn normalize_number(value: &Value) -> Normalized {
    match value {
        Value::Null => Normalized::clean(0.0),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Normalized::clean(v),
            _ => Normalized::degraded(format!("number {} is not representable", n)),
        },
        Value::String(s) => {
            let cleaned = strip_ansi(s);
            match cleaned.parse::<f64>() {
                Ok(v) if v.is_finite() => Normalized::clean(v),
                Ok(_) => Normalized::degraded(format!("non-finite progress value {:?}", s)),
                Err(_) => Normalized::degraded(format!("could not convert {:?} to a number", s)),
            }
        }
        other => Normalized::degraded(format!("unexpected progress value {}", other)),
    }
}

/// Integer completion percentage
///
/// `floor(min(100, downloaded * 100 / total))` when `total > 0`, else `0`.
/// Unknown totals never produce fictitious progress.
pub fn percentage(downloaded: f64, total: f64) -> u8 {
    if !total.is_finite() || total <= 0.0 || !downloaded.is_finite() || downloaded <= 0.0 {
        return 0;
    }
    (downloaded * 100.0 / total).min(100.0).floor() as u8
}

/// A normalized progress reading
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressSample {
    /// Percentage 0-100
    pub percent: u8,
    /// Bytes written so far
    pub downloaded_bytes: u64,
    /// Total size in bytes (0 when unknown)
    pub total_bytes: u64,
    /// Issues absorbed while normalizing
    pub issues: Vec<String>,
}

impl ProgressSample {
    /// Normalize the byte fields of a raw record
    ///
    /// The total falls back to `total_bytes_estimate` when the exact total is
    /// absent, null, non-positive or malformed, and to `0` when neither is
    /// usable.
    pub fn from_raw(raw: &RawProgress) -> Self {
        let mut issues = Vec::new();

        let downloaded = field(raw.downloaded_bytes.as_ref(), "downloaded_bytes", &mut issues);

        let mut total = field(raw.total_bytes.as_ref(), "total_bytes", &mut issues);
        if total <= 0.0 {
            total = field(
                raw.total_bytes_estimate.as_ref(),
                "total_bytes_estimate",
                &mut issues,
            );
        }

        Self {
            percent: percentage(downloaded, total),
            downloaded_bytes: to_bytes(downloaded),
            total_bytes: to_bytes(total),
            issues,
        }
    }
}

fn field(value: Option<&Value>, name: &str, issues: &mut Vec<String>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let normalized = normalize_number(value);
    if let Some(issue) = normalized.issue {
        issues.push(format!("{}: {}", name, issue));
    }
    normalized.value
}

fn to_bytes(value: f64) -> u64 {
    if value > 0.0 { value as u64 } else { 0 }
}
