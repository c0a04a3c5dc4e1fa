//! Constants for the download module (buffer sizing, timeouts, wire tokens).

use std::time::Duration;

/// Default packet size: bytes buffered before a forced flush to disk (10 MiB).
pub const DEFAULT_PACKET_SIZE: usize = 10 * 1024 * 1024;

/// Default inactivity timeout for a single read in async mode (30 seconds).
pub const DEFAULT_OPERATIONS_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on bytes requested from the stream by one fill.
pub(crate) const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Media type a request must carry to be decoded.
pub(crate) const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Content-Type parameter that carries the boundary token.
pub(crate) const BOUNDARY_PARAM: &str = "boundary=";

/// Separates a part's header block from its body.
pub(crate) const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Follows the last boundary of a body: `--boundary--` CRLF.
pub(crate) const CLOSING_DELIMITER_SUFFIX: &[u8] = b"--\r\n";

/// Content-Disposition token that introduces the original file name.
pub(crate) const FILENAME_TOKEN: &[u8] = b"filename=\"";

/// File name used when the client sent an empty or unusable one.
pub(crate) const FALLBACK_FILENAME: &str = "upload.bin";
