//! REST API server example
//!
//! Runs media-dl with the REST API enabled and shuts down cleanly on
//! Ctrl+C, waiting for running downloads to finish.
//!
//! Requires `yt-dlp` on PATH (or set `YTDLP_PATH`). Without it the server
//! still starts, but every submission is rejected.
//!
//! After starting, you can:
//! - Submit a download via POST http://localhost:8000/download
//! - Poll it via GET http://localhost:8000/progress/{video_id}
//! - Browse finished downloads at http://localhost:8000/
//! - Stream events via GET http://localhost:8000/events

use media_dl::MediaDownloader;
use media_dl::config::{ApiConfig, Config, DownloadConfig, ExtractorConfig, ServerIntegrationConfig};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_dl=info,tower_http=info".into()),
        )
        .init();

    let api_config = ApiConfig {
        bind_address: "127.0.0.1:8000".parse::<SocketAddr>()?,
        cors_enabled: true,
        cors_origins: vec!["*".to_string()],
        ..Default::default()
    };

    let config = Config {
        download: DownloadConfig {
            download_dir: "downloads".into(),
            ..Default::default()
        },
        extractor: ExtractorConfig {
            binary_path: std::env::var_os("YTDLP_PATH").map(Into::into),
            ..Default::default()
        },
        server: ServerIntegrationConfig { api: api_config },
        ..Default::default()
    };

    let downloader = MediaDownloader::new(config).await?;

    println!("Starting media-dl REST API server");
    println!("Gallery:       http://localhost:8000/");
    println!("OpenAPI:       http://localhost:8000/openapi.json");
    println!("Events stream: http://localhost:8000/events");
    println!();
    println!("Example commands:");
    println!("  # Submit a download (short links are accepted)");
    println!("  curl -X POST http://localhost:8000/download \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"url\": \"https://youtu.be/jNQXAC9IVRw\"}}'");
    println!();
    println!("  # Poll progress");
    println!("  curl http://localhost:8000/progress/0");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://localhost:8000/events");
    println!();

    // Serves until Ctrl+C or SIGTERM, then drains running downloads
    media_dl::run_with_shutdown(downloader).await?;

    Ok(())
}
