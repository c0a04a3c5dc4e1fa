//! Form Downloader Library
//!
//! Streams `multipart/form-data` request bodies to disk, one file per part,
//! with bounded memory, in either a blocking or an async (tokio) caller.
//!
//! # Architecture
//!
//! - [`download`] - content-type inspection, packet buffer, part parser,
//!   file sinks, and the [`MultipartDownloader`] façade
//!
//! Transport, TLS, and HTTP header parsing stay with the caller.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;

// Re-export commonly used types
pub use download::{
    DEFAULT_OPERATIONS_TIMEOUT, DEFAULT_PACKET_SIZE, DownloadError, DownloadOutcome,
    MultipartDownloader, Settings, extract_boundary, is_multipart_form_data,
};
