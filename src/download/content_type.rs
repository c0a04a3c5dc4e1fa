//! Content-Type inspection: media type check and boundary extraction.

use super::constants::{BOUNDARY_PARAM, MULTIPART_FORM_DATA};

/// Returns true when the Content-Type value names `multipart/form-data`.
///
/// Only the media type is checked; the rest of the grammar is not validated.
#[must_use]
pub fn is_multipart_form_data(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains(MULTIPART_FORM_DATA)
}

/// Extracts the boundary token from a Content-Type value.
///
/// Handles:
/// - `multipart/form-data; boundary=abc`
/// - `multipart/form-data; boundary=abc; charset=utf-8`
/// - `multipart/form-data; boundary="abc"`
///
/// The parameter name matches in any case; the value is returned verbatim.
/// Returns `None` when the parameter is absent or empty.
#[must_use]
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets, so `start` indexes the original.
    let start = content_type.to_ascii_lowercase().find(BOUNDARY_PARAM)? + BOUNDARY_PARAM.len();
    let value = &content_type[start..];

    let boundary = if let Some(quoted) = value.strip_prefix('"') {
        &quoted[..quoted.find('"')?]
    } else {
        let end = value
            .find(|c: char| c == ';' || c == ',' || c.is_whitespace())
            .unwrap_or(value.len());
        &value[..end]
    };

    (!boundary.is_empty()).then_some(boundary)
}
