//! Capped packet buffer with delimiter search and blocking/async fills.
//!
//! The buffer is the only place body bytes live between the stream and the
//! part file. It never grows past its capacity by filling: once full, the
//! search reports [`Scan::BufferFull`] and the caller must drain bytes before
//! asking for more. That outcome is ordinary backpressure, not an error.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use memchr::memmem;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::constants::READ_CHUNK_SIZE;
use super::error::DownloadError;

/// Outcome of searching the buffered bytes for a delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// Delimiter found; the value is the length of the buffered prefix that
    /// ends with it.
    Found(usize),
    /// Buffer reached capacity without containing the delimiter.
    BufferFull,
    /// Delimiter not buffered yet and there is room for more bytes.
    NeedMore,
}

#[derive(Debug)]
pub(crate) struct PacketReader {
    buf: Vec<u8>,
    head: usize,
    capacity: usize,
    // Bytes after `head` already searched without a match.
    scanned: usize,
}

impl PacketReader {
    /// Creates a reader seeded with bytes the caller read past the request
    /// headers. Seed bytes are never dropped, even beyond `capacity`.
    pub(crate) fn new(capacity: usize, leftover: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(capacity.min(READ_CHUNK_SIZE).max(leftover.len()));
        buf.extend_from_slice(leftover);
        Self {
            buf,
            head: 0,
            capacity,
            scanned: 0,
        }
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buf[self.head..]
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Drops `n` bytes from the front of the buffer.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.len(), "consume past end of buffer");
        self.head += n.min(self.len());
        self.scanned = 0;
        if self.head == self.buf.len() {
            self.buf.clear();
            self.head = 0;
        }
    }

    /// Searches the buffered bytes for `delimiter`.
    ///
    /// Repeated calls with the same delimiter only look at bytes that arrived
    /// since the previous call, plus enough overlap to catch a delimiter that
    /// straddles two fills.
    pub(crate) fn find(&mut self, delimiter: &[u8]) -> Scan {
        let data = &self.buf[self.head..];
        let from = self
            .scanned
            .saturating_sub(delimiter.len().saturating_sub(1))
            .min(data.len());

        if let Some(pos) = memmem::find(&data[from..], delimiter) {
            return Scan::Found(from + pos + delimiter.len());
        }

        self.scanned = data.len();
        if data.len() >= self.capacity {
            Scan::BufferFull
        } else {
            Scan::NeedMore
        }
    }

    /// Reads once from a blocking stream. Returns the number of new bytes;
    /// zero means the stream is exhausted.
    pub(crate) fn fill<R>(&mut self, stream: &mut R) -> Result<usize, DownloadError>
    where
        R: Read + ?Sized,
    {
        let start = self.reserve();
        let result = loop {
            match stream.read(&mut self.buf[start..]) {
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                other => break other.map_err(DownloadError::transport),
            }
        };
        self.commit(start, result)
    }

    /// Reads once from an async stream, giving up after `timeout` without
    /// data. Only this read is cancelled on expiry.
    pub(crate) async fn fill_async<R>(
        &mut self,
        stream: &mut R,
        timeout: Duration,
    ) -> Result<usize, DownloadError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let start = self.reserve();
        let result = match tokio::time::timeout(timeout, stream.read(&mut self.buf[start..])).await
        {
            Ok(read) => read.map_err(DownloadError::transport),
            Err(_elapsed) => Err(DownloadError::timeout(timeout)),
        };
        self.commit(start, result)
    }

    // Compacts consumed bytes away and appends a zeroed read window.
    // Returns where the window starts.
    fn reserve(&mut self) -> usize {
        if self.head > 0 {
            self.buf.drain(..self.head);
            self.head = 0;
        }
        let room = self.capacity.saturating_sub(self.buf.len());
        debug_assert!(room > 0, "fill requested on a full buffer");
        let start = self.buf.len();
        self.buf.resize(start + room.clamp(1, READ_CHUNK_SIZE), 0);
        start
    }

    fn commit(
        &mut self,
        start: usize,
        result: Result<usize, DownloadError>,
    ) -> Result<usize, DownloadError> {
        match result {
            Ok(n) => {
                self.buf.truncate(start + n);
                Ok(n)
            }
            Err(e) => {
                self.buf.truncate(start);
                Err(e)
            }
        }
    }
}
