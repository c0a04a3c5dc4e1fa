//! Streaming `multipart/form-data` decoder that writes file parts to disk.
//!
//! This module turns an HTTP request body into saved files without holding
//! the body in memory. The caller has already parsed the request headers and
//! hands over the Content-Type value, the stream, and any body bytes it read
//! past the headers.
//!
//! # Features
//!
//! - Bounded memory: at most `packet_size` bytes are buffered per download
//! - Boundaries split across reads or cut at the buffer cap are still found
//! - Blocking (`std::io::Read`) and async (`tokio::io::AsyncRead`) drivers
//!   sharing one parser
//! - Per-read inactivity timeout in async mode
//! - Partial files removed on any failure; completed parts kept
//! - Duplicate filename handling (`name(1).ext`, `name(2).ext`, ...)
//! - Header-seen and body-complete hooks
//!
//! # Example
//!
//! ```no_run
//! use form_downloader::download::{MultipartDownloader, Settings};
//! use std::sync::Arc;
//! use tokio::net::TcpStream;
//!
//! # async fn example(session: Arc<()>, mut socket: TcpStream, content_type: &str) {
//! let downloader = MultipartDownloader::new(Settings::new().with_output_directory("./uploads"));
//! let outcome = downloader
//!     .download(content_type, &mut socket, b"", Arc::clone(&session))
//!     .await;
//! println!("saved {} files", outcome.paths.len());
//! # }
//! ```

mod constants;
mod content_type;
mod downloader;
mod error;
mod filename;
mod parser;
mod reader;
mod settings;
mod sink;

pub use constants::{DEFAULT_OPERATIONS_TIMEOUT, DEFAULT_PACKET_SIZE};
pub use content_type::{extract_boundary, is_multipart_form_data};
pub use downloader::{DownloadOutcome, MultipartDownloader};
pub use error::DownloadError;
pub use settings::{FileBodyHook, FileHeaderHook, Settings};
