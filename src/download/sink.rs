//! Write handles for the part currently being received.
//!
//! A part file is created exclusively under the first free numbered variant
//! of its candidate path, and removed again when it is dropped
//! without [`finish`](PartFile::finish) having succeeded. Dropping covers
//! every abort path: an early `?` return, a timeout, or an async download
//! future dropped mid-body.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::error::DownloadError;
use super::filename::resolve_unique_path;

/// Blocking sink for one part.
#[derive(Debug)]
pub(crate) struct PartFile {
    path: PathBuf,
    file: Option<File>,
    bytes_written: u64,
}

impl PartFile {
    /// Creates the first free numbered variant of `candidate`.
    pub(crate) fn create(candidate: &Path) -> Result<Self, DownloadError> {
        let mut from = 0;
        loop {
            let (path, suffix) = resolve_unique_path(candidate, from)?;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        file: Some(file),
                        bytes_written: 0,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    from = lost_race(&path, suffix)?;
                }
                Err(e) => return Err(open_error(&path, &e)),
            }
        }
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> Result<(), DownloadError> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)
                .map_err(|e| DownloadError::io(&self.path, e))?;
            self.bytes_written += data.len() as u64;
        }
        Ok(())
    }

    /// Flushes and closes the file, returning its path and size.
    pub(crate) fn finish(mut self) -> Result<(PathBuf, u64), DownloadError> {
        if let Some(mut file) = self.file.take() {
            // On failure the handle is dropped here and `self` deletes the file.
            file.flush().map_err(|e| DownloadError::io(&self.path, e))?;
        }
        let path = std::mem::take(&mut self.path);
        Ok((path, self.bytes_written))
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        drop(self.file.take());
        discard(&self.path);
    }
}

/// Async sink for one part.
#[derive(Debug)]
pub(crate) struct AsyncPartFile {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    bytes_written: u64,
}

impl AsyncPartFile {
    pub(crate) async fn create(candidate: &Path) -> Result<Self, DownloadError> {
        let mut from = 0;
        loop {
            let (path, suffix) = resolve_unique_path(candidate, from)?;
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        file: Some(file),
                        bytes_written: 0,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    from = lost_race(&path, suffix)?;
                }
                Err(e) => return Err(open_error(&path, &e)),
            }
        }
    }

    pub(crate) async fn write(&mut self, data: &[u8]) -> Result<(), DownloadError> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(data)
                .await
                .map_err(|e| DownloadError::io(&self.path, e))?;
            self.bytes_written += data.len() as u64;
        }
        Ok(())
    }

    /// Flushes and closes the file, returning its path and size.
    ///
    /// The flush waits for tokio's background write to land before the path
    /// is handed out.
    pub(crate) async fn finish(mut self) -> Result<(PathBuf, u64), DownloadError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| DownloadError::io(&self.path, e))?;
        }
        let path = std::mem::take(&mut self.path);
        Ok((path, self.bytes_written))
    }
}

impl Drop for AsyncPartFile {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        drop(self.file.take());
        discard(&self.path);
    }
}

// Another writer created `path` between the existence check and our open.
fn lost_race(path: &Path, suffix: u64) -> Result<u64, DownloadError> {
    debug!(path = %path.display(), "output path taken concurrently, trying next suffix");
    suffix.checked_add(1).ok_or_else(|| {
        DownloadError::bad_descriptor(
            path,
            std::io::Error::other("no free numbered file name left"),
        )
    })
}

fn open_error(path: &Path, source: &std::io::Error) -> DownloadError {
    DownloadError::invalid_argument(format!("cannot open {}: {source}", path.display()))
}

// Best effort: a failed removal must not replace the error that caused it.
fn discard(path: &Path) {
    debug!(path = %path.display(), "removing partial file");
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove partial file");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_file_finish_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");

        let mut part = PartFile::create(&path).unwrap();
        part.write(b"hello ").unwrap();
        part.write(b"world").unwrap();
        let (finished, bytes) = part.finish().unwrap();

        assert_eq!(finished, path);
        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn test_part_file_drop_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");

        let mut part = PartFile::create(&path).unwrap();
        part.write(b"half").unwrap();
        assert!(path.exists());
        drop(part);

        assert!(!path.exists(), "partial file must be removed on drop");
    }

    #[test]
    fn test_part_file_create_skips_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("taken.txt");
        std::fs::write(&path, b"original").unwrap();

        let part = PartFile::create(&path).unwrap();
        let (created, _) = part.finish().unwrap();

        assert_eq!(created, temp_dir.path().join("taken(1).txt"));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"original",
            "existing file must be left alone"
        );
    }

    #[test]
    fn test_part_file_create_open_failure_is_invalid_argument() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("a.txt");

        let err = PartFile::create(&path).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidArgument { .. }));
    }

    #[test]
    fn test_part_file_concurrent_creates_get_distinct_names() {
        let temp_dir = TempDir::new().unwrap();
        let candidate = temp_dir.path().join("a.txt");
        let barrier = std::sync::Barrier::new(16);

        let mut paths: Vec<PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        let part = PartFile::create(&candidate).unwrap();
                        part.finish().unwrap().0
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 16, "every create must get its own file");
        assert!(paths.contains(&candidate));
        assert!(paths.contains(&temp_dir.path().join("a(15).txt")));
    }

    #[test]
    fn test_lost_race_moves_to_next_suffix() {
        let path = Path::new("a(3).txt");
        assert_eq!(lost_race(path, 3).unwrap(), 4);
        assert!(matches!(
            lost_race(path, u64::MAX),
            Err(DownloadError::BadDescriptor { .. })
        ));
    }

    #[tokio::test]
    async fn test_async_part_file_roundtrip_and_drop() {
        let temp_dir = TempDir::new().unwrap();
        let kept = temp_dir.path().join("kept.bin");
        let dropped = temp_dir.path().join("dropped.bin");

        let mut part = AsyncPartFile::create(&kept).await.unwrap();
        part.write(&[1, 2, 3]).await.unwrap();
        let (path, bytes) = part.finish().await.unwrap();
        assert_eq!(path, kept);
        assert_eq!(bytes, 3);
        assert_eq!(std::fs::read(&kept).unwrap(), vec![1, 2, 3]);

        let mut part = AsyncPartFile::create(&dropped).await.unwrap();
        part.write(&[4]).await.unwrap();
        drop(part);
        assert!(!dropped.exists());
    }
}
