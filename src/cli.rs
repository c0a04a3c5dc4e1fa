//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use form_downloader::DEFAULT_PACKET_SIZE;

const MIN_PACKET_SIZE: usize = 64;

/// Save the file parts of a captured multipart/form-data body.
///
/// Reads the body from INPUT (or stdin) and writes each file part into the
/// output directory, printing the saved paths.
#[derive(Parser, Debug)]
#[command(name = "form-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Content-Type header value of the request, including the boundary
    #[arg(short = 't', long)]
    pub content_type: String,

    /// File holding the request body (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Directory saved files are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum bytes buffered before flushing to disk
    #[arg(long, default_value_t = DEFAULT_PACKET_SIZE, value_parser = parse_packet_size)]
    pub packet_size: usize,

    /// Seconds a single read may wait for data (async mode only, 1-3600)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Use the blocking reader instead of the async one
    #[arg(long)]
    pub blocking: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_packet_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|_| format!("`{value}` is not a byte count"))?;
    if size < MIN_PACKET_SIZE {
        return Err(format!("packet size must be at least {MIN_PACKET_SIZE} bytes"));
    }
    Ok(size)
}
