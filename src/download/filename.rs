//! Filename extraction, sanitization, and output path resolution for parts.
//!
//! Output paths are resolved in two steps: a candidate (from the header hook,
//! or `output_directory/<file name>`), then a collision pass that rewrites the
//! stem to `name(1).ext`, `name(2).ext`, ... until a free path is found. The
//! collision pass runs again whenever an exclusive create loses a race.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use memchr::{memmem, memrchr};
use tracing::debug;

use super::constants::{FALLBACK_FILENAME, FILENAME_TOKEN};
use super::error::DownloadError;
use super::settings::Settings;

/// Pulls the `filename="..."` value out of a part header block.
///
/// The value runs to the last quote on the same header line, so names with
/// embedded quotes survive.
pub(crate) fn parse_file_name(header: &[u8]) -> Result<String, DownloadError> {
    let start = memmem::find(header, FILENAME_TOKEN)
        .ok_or_else(|| DownloadError::not_found("filename field in part header"))?
        + FILENAME_TOKEN.len();
    let rest = &header[start..];
    let line = &rest[..memmem::find(rest, b"\r\n").unwrap_or(rest.len())];
    let end = memrchr(b'"', line)
        .ok_or_else(|| DownloadError::not_found("closing quote of filename"))?;
    Ok(String::from_utf8_lossy(&line[..end]).into_owned())
}

/// Sanitizes a client-supplied name into a single safe path component.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Resolves the absolute candidate output path for a part.
///
/// The candidate may already exist; the sink picks the free numbered variant
/// at create time through [`resolve_unique_path`].
///
/// # Errors
///
/// Returns [`DownloadError::BadDescriptor`] when the path cannot be made
/// absolute.
pub(crate) fn resolve_output_path(
    settings: &Settings,
    file_name: &str,
) -> Result<PathBuf, DownloadError> {
    let from_hook = settings
        .file_header_hook()
        .map(|hook| hook(file_name))
        .filter(|path| !path.as_os_str().is_empty());

    let candidate = match from_hook {
        Some(path) => path,
        None => settings
            .output_directory()
            .join(sanitize_filename(file_name)),
    };
    let path =
        std::path::absolute(&candidate).map_err(|e| DownloadError::bad_descriptor(&candidate, e))?;

    debug!(file_name, path = %path.display(), "resolved candidate path");
    Ok(path)
}

/// Returns the first free path at or after suffix `from`, with its suffix.
///
/// Suffix 0 is `candidate` itself; suffix `n` rewrites the stem to
/// `stem(n).ext`. A caller that loses a create race retries from `n + 1`.
///
/// # Errors
///
/// Returns [`DownloadError::BadDescriptor`] when an existence check fails or
/// every suffix is taken, and [`DownloadError::InvalidArgument`] when the
/// candidate has no file name.
pub(crate) fn resolve_unique_path(
    candidate: &Path,
    from: u64,
) -> Result<(PathBuf, u64), DownloadError> {
    if from == 0 && !exists(candidate)? {
        return Ok((candidate.to_path_buf(), 0));
    }

    let stem = candidate.file_stem().ok_or_else(|| {
        DownloadError::invalid_argument(format!(
            "output path {} has no file name",
            candidate.display()
        ))
    })?;
    let extension = candidate.extension();

    for n in from.max(1)..=u64::MAX {
        let mut name = OsString::from(stem);
        name.push(format!("({n})"));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        let path = candidate.with_file_name(name);
        if !exists(&path)? {
            return Ok((path, n));
        }
    }

    Err(DownloadError::bad_descriptor(
        candidate,
        std::io::Error::other("no free numbered file name left"),
    ))
}

fn exists(path: &Path) -> Result<bool, DownloadError> {
    path.try_exists()
        .map_err(|e| DownloadError::bad_descriptor(path, e))
}
