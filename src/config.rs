//! Configuration types for media-dl

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Download behavior configuration (output directory, format, shutdown)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloaded files are written to (default: "./downloads")
    ///
    /// Files are named `{job_id}.{file_extension}`. The directory is also
    /// served read-only by the API under `/downloads`.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Extension of the output file (default: "mp4")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Format selector passed to the extractor (default: "best")
    #[serde(default = "default_format")]
    pub format: String,

    /// How long shutdown waits for running downloads (default: 30 seconds)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            file_extension: default_file_extension(),
            format: default_format(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Extractor settings (binary location, trust relaxation, timeouts)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for the binary if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Skip TLS certificate validation when downloading (default: true)
    ///
    /// Several target hosts serve broken certificate chains. This is a
    /// deliberate trust relaxation and is logged when the downloader starts.
    #[serde(default = "default_true")]
    pub skip_certificate_check: bool,

    /// Upper bound for a metadata lookup (default: 60 seconds)
    #[serde(default = "default_metadata_timeout", with = "duration_serde")]
    pub metadata_timeout: Duration,

    /// Additional arguments appended to every download invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
            skip_certificate_check: true,
            metadata_timeout: default_metadata_timeout(),
            extra_args: Vec::new(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve the download directory read-only under /downloads (default: true)
    #[serde(default = "default_true")]
    pub serve_downloads: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            serve_downloads: true,
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for MediaDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) - output directory, format, shutdown
/// - [`extractor`](ExtractorConfig) - extractor binary and its options
/// - [`server`](ServerIntegrationConfig) - REST API
///
/// Every field has a default, so `Config::default()` works out of the box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Extractor settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// API settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download: DownloadConfig::default(),
            extractor: ExtractorConfig::default(),
            server: ServerIntegrationConfig::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> crate::Result<()> {
        let ext = &self.download.file_extension;
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(crate::Error::Config {
                message: format!("invalid file extension '{}'", ext),
                key: Some("file_extension".to_string()),
            });
        }
        if self.download.format.trim().is_empty() {
            return Err(crate::Error::Config {
                message: "format selector must not be empty".to_string(),
                key: Some("format".to_string()),
            });
        }
        if self.event_buffer == 0 {
            return Err(crate::Error::Config {
                message: "event buffer must be at least 1".to_string(),
                key: Some("event_buffer".to_string()),
            });
        }
        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_file_extension() -> String {
    "mp4".to_string()
}

fn default_format() -> String {
    "best".to_string()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_metadata_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_event_buffer() -> usize {
    1000
}

// Durations are (de)serialized as whole seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
