//! Media extraction backends
//!
//! The [`Extractor`] trait is the seam between job orchestration and the tool
//! that actually talks to media sites. Two implementations ship with the
//! crate:
//!
//! - [`YtDlpExtractor`]: runs the external `yt-dlp` binary
//! - [`UnavailableExtractor`]: stand-in when no binary is found; every
//!   submission fails at metadata resolution
//!
//! ## Usage
//!
//! ```no_run
//! use media_dl::extractor::{Extractor, YtDlpExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = YtDlpExtractor::from_path().expect("yt-dlp binary not found");
//!
//!     let metadata = extractor
//!         .fetch_metadata("https://www.youtube.com/watch?v=aqz-KE-bpKQ")
//!         .await?;
//!     println!("{} ({:?}s)", metadata.title, metadata.duration);
//!
//!     Ok(())
//! }
//! ```

mod noop;
mod parser;
mod traits;
mod ytdlp;

pub use noop::UnavailableExtractor;
pub use parser::{
    PROGRESS_MARKER, ProgressLine, extract_error_message, parse_metadata_json,
    parse_progress_line,
};
pub use traits::{DownloadRequest, Extractor, ProgressSender};
pub use ytdlp::YtDlpExtractor;
