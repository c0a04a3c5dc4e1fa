//! Multipart part parser.
//!
//! [`PartParser`] is a transport-independent state machine. It owns the
//! packet buffer and tells its driver what to do next through [`Step`]; the
//! driver performs the IO (blocking or async) and calls back in. Both the
//! blocking and the async downloader run this same machine, which is what
//! keeps their output identical.
//!
//! ```text
//! AwaitFirstBoundary -> Header -> Body -> PartEnd -> Trailer -> Header ...
//!                                                          \-> Done
//! ```
//!
//! Any error moves the machine to `Failed`, which it never leaves.

use super::constants::{CLOSING_DELIMITER_SUFFIX, HEADER_TERMINATOR};
use super::error::DownloadError;
use super::filename::parse_file_name;
use super::reader::{PacketReader, Scan};

/// What the driver must do before calling [`PartParser::next_step`] again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Read more bytes into [`PartParser::reader_mut`]. A zero-byte read must
    /// be reported through [`PartParser::end_of_stream`].
    Fill,
    /// A part header was parsed; open a sink for this client file name.
    PartStarted(String),
    /// Write `body(n)` to the open sink.
    Write(usize),
    /// The open part's body is complete; close and publish it.
    PartFinished,
    /// The closing delimiter was seen.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitFirstBoundary,
    Header,
    Body,
    PartEnd,
    Trailer,
    Done,
    Failed,
}

#[derive(Debug)]
pub(crate) struct PartParser {
    reader: PacketReader,
    // `--boundary`: the first delimiter may not be preceded by CRLF.
    first_delimiter: Vec<u8>,
    // `\r\n--boundary`: terminates every body.
    body_delimiter: Vec<u8>,
    phase: Phase,
    // Bytes handed out by the last `Write` step, consumed on the next call.
    pending: usize,
}

impl PartParser {
    pub(crate) fn new(boundary: &str, reader: PacketReader) -> Self {
        let first_delimiter = [b"--".as_slice(), boundary.as_bytes()].concat();
        let body_delimiter = [b"\r\n".as_slice(), first_delimiter.as_slice()].concat();
        Self {
            reader,
            first_delimiter,
            body_delimiter,
            phase: Phase::AwaitFirstBoundary,
            pending: 0,
        }
    }

    /// Length of the delimiter that ends a body; the buffer keeps at least
    /// this many trailing bytes across a forced flush.
    pub(crate) fn delimiter_len(boundary: &str) -> usize {
        boundary.len() + 4
    }

    pub(crate) fn reader_mut(&mut self) -> &mut PacketReader {
        &mut self.reader
    }

    /// Body bytes announced by the last [`Step::Write`].
    pub(crate) fn body(&self, len: usize) -> &[u8] {
        &self.reader.bytes()[..len]
    }

    /// Advances the machine until the driver has something to do.
    pub(crate) fn next_step(&mut self) -> Result<Step, DownloadError> {
        if self.pending > 0 {
            self.reader.consume(self.pending);
            self.pending = 0;
        }

        loop {
            match self.phase {
                Phase::AwaitFirstBoundary => match self.reader.find(&self.first_delimiter) {
                    Scan::Found(end) => {
                        self.reader.consume(end);
                        self.phase = Phase::Header;
                    }
                    Scan::BufferFull => return Err(self.fail("boundary before first part")),
                    Scan::NeedMore => return Ok(Step::Fill),
                },
                Phase::Header => match self.reader.find(HEADER_TERMINATOR) {
                    Scan::Found(end) => {
                        let file_name = match parse_file_name(&self.reader.bytes()[..end]) {
                            Ok(name) => name,
                            Err(e) => {
                                self.phase = Phase::Failed;
                                return Err(e);
                            }
                        };
                        self.reader.consume(end);
                        self.phase = Phase::Body;
                        return Ok(Step::PartStarted(file_name));
                    }
                    Scan::BufferFull => return Err(self.fail("part header terminator")),
                    Scan::NeedMore => return Ok(Step::Fill),
                },
                Phase::Body => match self.reader.find(&self.body_delimiter) {
                    Scan::Found(end) => {
                        let data_len = end - self.body_delimiter.len();
                        self.phase = Phase::PartEnd;
                        if data_len > 0 {
                            self.pending = data_len;
                            return Ok(Step::Write(data_len));
                        }
                    }
                    Scan::BufferFull => {
                        // Keep a delimiter's worth of bytes: it may be the
                        // start of a boundary cut off by the cap.
                        let flush = self.reader.len() - self.body_delimiter.len();
                        self.pending = flush;
                        return Ok(Step::Write(flush));
                    }
                    Scan::NeedMore => return Ok(Step::Fill),
                },
                Phase::PartEnd => {
                    self.reader.consume(self.body_delimiter.len());
                    self.phase = Phase::Trailer;
                    return Ok(Step::PartFinished);
                }
                Phase::Trailer => {
                    // Only `--` CRLF closes the body; anything else starts a header.
                    let next = self.reader.bytes();
                    let closing = CLOSING_DELIMITER_SUFFIX;
                    let seen = next.len().min(closing.len());
                    if next[..seen] != closing[..seen] {
                        self.phase = Phase::Header;
                    } else if seen < closing.len() {
                        return Ok(Step::Fill);
                    } else {
                        self.phase = Phase::Done;
                    }
                }
                Phase::Done => return Ok(Step::Done),
                Phase::Failed => {
                    return Err(DownloadError::invalid_argument("download already failed"));
                }
            }
        }
    }

    /// Turns a zero-byte read into the error for the current phase.
    pub(crate) fn end_of_stream(&mut self) -> DownloadError {
        let what = match self.phase {
            Phase::AwaitFirstBoundary => "boundary before first part",
            Phase::Header => "part header terminator",
            Phase::Body | Phase::PartEnd => "boundary after part body",
            Phase::Trailer | Phase::Done | Phase::Failed => "closing boundary",
        };
        self.fail(what)
    }

    fn fail(&mut self, what: &'static str) -> DownloadError {
        self.phase = Phase::Failed;
        DownloadError::not_found(what)
    }
}
