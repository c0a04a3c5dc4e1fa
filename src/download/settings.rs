//! Per-download settings and part hooks.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::constants::{DEFAULT_OPERATIONS_TIMEOUT, DEFAULT_PACKET_SIZE};
use super::error::DownloadError;

/// Called with the client-supplied file name once a part header is parsed.
///
/// The returned path becomes the candidate output path. Returning an empty
/// path falls back to `output_directory/<file name>`.
pub type FileHeaderHook = Arc<dyn Fn(&str) -> PathBuf + Send + Sync>;

/// Called with the final path once a part body is fully written and closed.
pub type FileBodyHook = Arc<dyn Fn(&Path) + Send + Sync>;

/// Settings applied to a single multipart download.
///
/// # Example
///
/// ```
/// use form_downloader::Settings;
/// use std::time::Duration;
///
/// let settings = Settings::new()
///     .with_packet_size(64 * 1024)
///     .with_operations_timeout(Duration::from_secs(5))
///     .with_output_directory("/tmp/uploads")
///     .on_file_body(|path| println!("{} is downloaded", path.display()));
/// assert_eq!(settings.packet_size(), 64 * 1024);
/// ```
#[derive(Clone)]
pub struct Settings {
    packet_size: usize,
    operations_timeout: Duration,
    output_directory: PathBuf,
    on_file_header: Option<FileHeaderHook>,
    on_file_body: Option<FileBodyHook>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            operations_timeout: DEFAULT_OPERATIONS_TIMEOUT,
            output_directory: PathBuf::from("."),
            on_file_header: None,
            on_file_body: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("packet_size", &self.packet_size)
            .field("operations_timeout", &self.operations_timeout)
            .field("output_directory", &self.output_directory)
            .field("on_file_header", &self.on_file_header.is_some())
            .field("on_file_body", &self.on_file_body.is_some())
            .finish()
    }
}

impl Settings {
    /// Creates settings with defaults: 10 MiB packets, 30 s timeout, current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of bytes buffered before a forced flush.
    #[must_use]
    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size;
        self
    }

    /// Sets the inactivity timeout for each read in async mode.
    #[must_use]
    pub fn with_operations_timeout(mut self, timeout: Duration) -> Self {
        self.operations_timeout = timeout;
        self
    }

    /// Sets the directory generated output paths are placed in.
    #[must_use]
    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = dir.into();
        self
    }

    /// Installs the header-seen hook.
    #[must_use]
    pub fn on_file_header<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> PathBuf + Send + Sync + 'static,
    {
        self.on_file_header = Some(Arc::new(hook));
        self
    }

    /// Installs the body-complete hook.
    #[must_use]
    pub fn on_file_body<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        self.on_file_body = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    #[must_use]
    pub fn operations_timeout(&self) -> Duration {
        self.operations_timeout
    }

    #[must_use]
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub(crate) fn file_header_hook(&self) -> Option<&FileHeaderHook> {
        self.on_file_header.as_ref()
    }

    pub(crate) fn file_body_hook(&self) -> Option<&FileBodyHook> {
        self.on_file_body.as_ref()
    }

    /// Checks the settings against the body delimiter they will be used with.
    ///
    /// The packet buffer must hold the delimiter twice over: a forced flush
    /// keeps one delimiter length of trailing bytes, and must still free room.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidArgument`] for a packet size that is
    /// too small.
    pub fn validate(&self, delimiter_len: usize) -> Result<(), DownloadError> {
        let minimum = delimiter_len.saturating_mul(2);
        if self.packet_size < minimum {
            return Err(DownloadError::invalid_argument(format!(
                "packet size {} is below the {minimum} bytes needed for this boundary",
                self.packet_size
            )));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), and also rejects a zero operations
    /// timeout, which only the async driver uses.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidArgument`] for a packet size that is
    /// too small or a zero timeout.
    pub fn validate_async(&self, delimiter_len: usize) -> Result<(), DownloadError> {
        self.validate(delimiter_len)?;
        if self.operations_timeout.is_zero() {
            return Err(DownloadError::invalid_argument(
                "operations timeout must be non-zero",
            ));
        }
        Ok(())
    }
}
