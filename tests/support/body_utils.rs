//! Shared utilities for download tests: multipart body builder and test
//! streams that split, stall, count, or fail reads.
//!
//! Used by `tests/download_integration.rs` to feed identical bodies through
//! the blocking and async drivers under different chunkings.

#![allow(dead_code)]

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Boundary used by most tests; long enough to straddle small chunks.
pub const BOUNDARY: &str = "----formBoundary7MA4YWxkTrZu0gW";

/// Content-Type value matching [`BOUNDARY`].
pub fn content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Deterministic binary payload of `len` bytes (includes CR and LF bytes).
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from((i * 31 + usize::from(seed)) % 251).unwrap_or(0))
        .collect()
}

/// Builds a multipart/form-data body with one file part per entry.
pub fn multipart_body(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = b"preamble ignored by parsers\r\n".to_vec();
    for (index, (file_name, data)) in parts.iter().enumerate() {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file{index}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Stream that hands out at most `chunk` bytes per read, then optionally
/// fails once `fail_after` bytes have been delivered.
#[derive(Debug)]
pub struct ChunkedStream {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    fail_after: Option<usize>,
    reads: Arc<AtomicUsize>,
}

impl ChunkedStream {
    pub fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk: chunk.max(1),
            fail_after: None,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes reads fail with `ConnectionReset` once `bytes` have been read.
    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    /// Shared counter of read calls, readable after the stream is consumed.
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    fn next_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let mut end = self.data.len().min(self.pos + self.chunk);
        if let Some(limit) = self.fail_after {
            if self.pos >= limit {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ));
            }
            end = end.min(limit);
        }

        let n = (end - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Read for ChunkedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.next_chunk(buf)
    }
}

impl AsyncRead for ChunkedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = this.next_chunk(buf.initialize_unfilled())?;
        buf.advance(n);
        Poll::Ready(Ok(()))
    }
}

/// Sorted file names currently in `dir`.
pub fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
