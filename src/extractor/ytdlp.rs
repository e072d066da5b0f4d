//! yt-dlp backed extractor

use super::parser::{PROGRESS_MARKER, ProgressLine, extract_error_message, parse_metadata_json, parse_progress_line};
use super::traits::{DownloadRequest, Extractor, ProgressSender};
use crate::config::ExtractorConfig;
use crate::types::VideoMetadata;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Extractor that shells out to the `yt-dlp` binary
///
/// Metadata comes from `--dump-single-json`. Downloads print one JSON
/// progress record per line on stdout (see [`PROGRESS_MARKER`]), which are
/// forwarded to the worker as they arrive. The child process is killed if the
/// future driving it is dropped.
///
/// # Examples
///
/// ```no_run
/// use media_dl::extractor::{Extractor, YtDlpExtractor};
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let extractor = YtDlpExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found in PATH");
/// assert_eq!(extractor.name(), "yt-dlp");
/// ```
#[derive(Clone, Debug)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    metadata_timeout: Duration,
    skip_certificate_check: bool,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit binary path and default options
    pub fn new(binary_path: PathBuf) -> Self {
        let defaults = ExtractorConfig::default();
        Self {
            binary_path,
            metadata_timeout: defaults.metadata_timeout,
            skip_certificate_check: defaults.skip_certificate_check,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build from configuration
    ///
    /// Uses `binary_path` when set, otherwise searches PATH if `search_path`
    /// is enabled. Returns `None` when no binary could be located.
    pub fn from_config(config: &ExtractorConfig) -> Option<Self> {
        let base = match &config.binary_path {
            Some(path) => Some(Self::new(path.clone())),
            None if config.search_path => Self::from_path(),
            None => None,
        }?;

        Some(Self {
            metadata_timeout: config.metadata_timeout,
            skip_certificate_check: config.skip_certificate_check,
            ..base
        })
    }

    /// Path of the binary this extractor runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    fn metadata_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-color".to_string(),
        ];
        if self.skip_certificate_check {
            args.push("--no-check-certificates".to_string());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

/// Arguments for one download invocation
pub(crate) fn download_args(request: &DownloadRequest) -> Vec<String> {
    // yt-dlp treats -o as an output template
    let output = request.output_path.to_string_lossy().replace('%', "%%");

    let mut args = vec![
        "-f".to_string(),
        request.format.clone(),
        "-o".to_string(),
        output,
        "--no-playlist".to_string(),
        // a clean exit that leaves no output file still fails the job
        "--ignore-errors".to_string(),
        // identifiers restart with the process; never resume or skip an old file
        "--force-overwrites".to_string(),
        "--newline".to_string(),
        "--no-color".to_string(),
        "--no-warnings".to_string(),
        "--quiet".to_string(),
        "--progress".to_string(),
        "--progress-template".to_string(),
        format!("download:{}%(progress)j", PROGRESS_MARKER),
    ];
    if request.skip_certificate_check {
        args.push("--no-check-certificates".to_string());
    }
    args.extend(request.extra_args.iter().cloned());
    args.push("--".to_string());
    args.push(request.url.clone());
    args
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn fetch_metadata(&self, url: &str) -> crate::Result<VideoMetadata> {
        let run = Command::new(&self.binary_path)
            .args(self.metadata_args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.metadata_timeout, run)
            .await
            .map_err(|_| {
                crate::Error::Resolution(format!(
                    "metadata lookup timed out after {}s",
                    self.metadata_timeout.as_secs()
                ))
            })?
            .map_err(|e| crate::Error::Resolution(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let message = extract_error_message(&output.stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(crate::Error::Resolution(message));
        }

        parse_metadata_json(&output.stdout)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> crate::Result<()> {
        let mut child = Command::new(&self.binary_path)
            .args(download_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crate::Error::Extractor(format!("Failed to execute yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| crate::Error::Extractor("yt-dlp stdout not captured".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| crate::Error::Extractor("yt-dlp stderr not captured".into()))?;

        let read_progress = async {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_progress_line(&line) {
                        ProgressLine::Record(record) => {
                            // receiver gone means nobody cares any more
                            let _ = progress.send(record);
                        }
                        ProgressLine::Malformed(reason) => {
                            tracing::warn!(url = %request.url, reason = %reason, "skipping progress line");
                        }
                        ProgressLine::Other => {
                            tracing::trace!(line = %line, "yt-dlp output");
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read yt-dlp output");
                        break;
                    }
                }
            }
        };

        let read_errors = async {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                tracing::warn!(error = %e, "failed to read yt-dlp stderr");
            }
            buf
        };

        let ((), stderr_buf) = tokio::join!(read_progress, read_errors);

        let status = child
            .wait()
            .await
            .map_err(|e| crate::Error::Extractor(format!("Failed to wait for yt-dlp: {}", e)))?;

        if !status.success() {
            let message = extract_error_message(&stderr_buf)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            return Err(crate::Error::Extractor(message));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
