//! Multipart downloader façade: blocking and async drivers.
//!
//! Both drivers run the same [`PartParser`] and differ only in how they fill
//! the packet buffer and write part files. The async driver suspends at every
//! fill and write; the blocking driver parks its thread instead.

use std::io::Read;
use std::path::PathBuf;

use tokio::io::AsyncRead;
use tracing::{debug, info, instrument, warn};

use super::content_type::{extract_boundary, is_multipart_form_data};
use super::error::DownloadError;
use super::filename::resolve_output_path;
use super::parser::{PartParser, Step};
use super::reader::PacketReader;
use super::settings::Settings;
use super::sink::{AsyncPartFile, PartFile};

/// Result of a multipart download.
///
/// `paths` lists every fully written part in arrival order. When `error` is
/// set the download stopped early; the listed files are still complete and
/// no partially written file is left on disk.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    /// Saved files, in the order their parts arrived.
    pub paths: Vec<PathBuf>,
    /// Total body bytes written across `paths`.
    pub bytes_written: u64,
    /// Why the download stopped early, if it did.
    pub error: Option<DownloadError>,
}

impl DownloadOutcome {
    /// Returns true when every part up to the closing boundary was saved.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, discarding the saved paths on error.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the download.
    pub fn into_result(self) -> Result<Vec<PathBuf>, DownloadError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.paths),
        }
    }

    fn failed(error: DownloadError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Streams `multipart/form-data` bodies to files.
///
/// A downloader holds only settings, so one instance can serve any number
/// of requests, including concurrently from several threads or tasks. Each
/// call owns its own buffer and state.
///
/// # Example
///
/// ```no_run
/// use form_downloader::{MultipartDownloader, Settings};
/// use std::net::TcpStream;
///
/// # fn example(mut socket: TcpStream, content_type: &str, leftover: &[u8]) {
/// let downloader = MultipartDownloader::new(Settings::new().with_output_directory("uploads"));
/// let outcome = downloader.download_blocking(content_type, &mut socket, leftover);
/// for path in &outcome.paths {
///     println!("saved {}", path.display());
/// }
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartDownloader {
    settings: Settings,
}

impl MultipartDownloader {
    /// Creates a downloader with the given settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Downloads every file part of a body read from a blocking stream.
    ///
    /// `leftover` holds body bytes the caller already pulled off the stream
    /// while parsing request headers. No timeout is enforced in this mode.
    #[instrument(skip(self, stream, leftover), fields(leftover = leftover.len()))]
    pub fn download_blocking<R>(
        &self,
        content_type: &str,
        stream: &mut R,
        leftover: &[u8],
    ) -> DownloadOutcome
    where
        R: Read + ?Sized,
    {
        let mut parser = match self.prepare(content_type, leftover, Settings::validate) {
            Ok(parser) => parser,
            Err(error) => return rejected(error),
        };

        let mut outcome = DownloadOutcome::default();
        let result = self.drive_blocking(&mut parser, stream, &mut outcome);
        finish(outcome, result)
    }

    /// Downloads every file part of a body read from an async stream.
    ///
    /// Each read suspends the task and fails with
    /// [`DownloadError::Timeout`] if no data arrives within the operations
    /// timeout. `keep_alive` is typically an `Arc` of the owning session; it
    /// is held until the whole download finishes (or the future is dropped),
    /// not just across a single read.
    #[instrument(skip(self, stream, leftover, keep_alive), fields(leftover = leftover.len()))]
    pub async fn download<R, K>(
        &self,
        content_type: &str,
        stream: &mut R,
        leftover: &[u8],
        keep_alive: K,
    ) -> DownloadOutcome
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let _keep_alive = keep_alive;

        let mut parser = match self.prepare(content_type, leftover, Settings::validate_async) {
            Ok(parser) => parser,
            Err(error) => return rejected(error),
        };

        let mut outcome = DownloadOutcome::default();
        let result = self.drive_async(&mut parser, stream, &mut outcome).await;
        finish(outcome, result)
    }

    fn prepare(
        &self,
        content_type: &str,
        leftover: &[u8],
        validate: fn(&Settings, usize) -> Result<(), DownloadError>,
    ) -> Result<PartParser, DownloadError> {
        if !is_multipart_form_data(content_type) {
            return Err(DownloadError::invalid_argument(format!(
                "content type {content_type:?} is not multipart/form-data"
            )));
        }
        let boundary = extract_boundary(content_type)
            .ok_or_else(|| DownloadError::not_found("boundary parameter in content type"))?;
        validate(&self.settings, PartParser::delimiter_len(boundary))?;

        debug!(boundary, packet_size = self.settings.packet_size(), "starting multipart download");
        let reader = PacketReader::new(self.settings.packet_size(), leftover);
        Ok(PartParser::new(boundary, reader))
    }

    fn drive_blocking<R>(
        &self,
        parser: &mut PartParser,
        stream: &mut R,
        outcome: &mut DownloadOutcome,
    ) -> Result<(), DownloadError>
    where
        R: Read + ?Sized,
    {
        // Dropping an unfinished part removes its file, so every `?` below
        // cleans up after itself.
        let mut part: Option<PartFile> = None;

        loop {
            match parser.next_step()? {
                Step::Fill => {
                    if parser.reader_mut().fill(stream)? == 0 {
                        return Err(parser.end_of_stream());
                    }
                }
                Step::PartStarted(file_name) => {
                    let candidate = resolve_output_path(&self.settings, &file_name)?;
                    part = Some(PartFile::create(&candidate)?);
                }
                Step::Write(len) => {
                    if let Some(file) = part.as_mut() {
                        file.write(parser.body(len))?;
                    }
                }
                Step::PartFinished => {
                    if let Some(file) = part.take() {
                        let (path, bytes) = file.finish()?;
                        self.publish(outcome, path, bytes);
                    }
                }
                Step::Done => return Ok(()),
            }
        }
    }

    async fn drive_async<R>(
        &self,
        parser: &mut PartParser,
        stream: &mut R,
        outcome: &mut DownloadOutcome,
    ) -> Result<(), DownloadError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let timeout = self.settings.operations_timeout();
        let mut part: Option<AsyncPartFile> = None;

        loop {
            match parser.next_step()? {
                Step::Fill => {
                    if parser.reader_mut().fill_async(stream, timeout).await? == 0 {
                        return Err(parser.end_of_stream());
                    }
                }
                Step::PartStarted(file_name) => {
                    let candidate = resolve_output_path(&self.settings, &file_name)?;
                    part = Some(AsyncPartFile::create(&candidate).await?);
                }
                Step::Write(len) => {
                    if let Some(file) = part.as_mut() {
                        file.write(parser.body(len)).await?;
                    }
                }
                Step::PartFinished => {
                    if let Some(file) = part.take() {
                        let (path, bytes) = file.finish().await?;
                        self.publish(outcome, path, bytes);
                    }
                }
                Step::Done => return Ok(()),
            }
        }
    }

    fn publish(&self, outcome: &mut DownloadOutcome, path: PathBuf, bytes: u64) {
        if let Some(hook) = self.settings.file_body_hook() {
            hook(&path);
        }
        info!(path = %path.display(), bytes, "part saved");
        outcome.bytes_written += bytes;
        outcome.paths.push(path);
    }
}

fn rejected(error: DownloadError) -> DownloadOutcome {
    warn!(error = %error, "multipart download rejected");
    DownloadOutcome::failed(error)
}

fn finish(mut outcome: DownloadOutcome, result: Result<(), DownloadError>) -> DownloadOutcome {
    match result {
        Ok(()) => info!(
            files = outcome.paths.len(),
            bytes = outcome.bytes_written,
            "multipart download complete"
        ),
        Err(error) => {
            warn!(
                error = %error,
                saved = outcome.paths.len(),
                "multipart download failed"
            );
            outcome.error = Some(error);
        }
    }
    outcome
}
