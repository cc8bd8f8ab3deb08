//! Whether a matched response is captured for rendering.

use crate::rule::Rule;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};

/// Extension of the last path segment, dot included (`/a/b.html` gives
/// `.html`). Empty when the last segment has no dot.
#[must_use]
pub fn request_extension(path: &str) -> &str {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(i) => &segment[i..],
        None => "",
    }
}

/// Registered MIME essence for an extension such as `.html`.
#[must_use]
pub fn registered_content_type(ext: &str) -> Option<&'static str> {
    mime_guess::from_ext(ext.trim_start_matches('.')).first_raw()
}

/// Decide from the response head whether the body should be buffered.
///
/// A request with an extension is buffered when the rule lists that exact
/// extension. An extensionless request is buffered when the response
/// `Content-Type` contains the registered type of one of the rule's
/// extensions.
#[must_use]
pub fn should_buffer(
    rule: &Rule,
    request_ext: &str,
    _status: StatusCode,
    headers: &HeaderMap,
) -> bool {
    if !request_ext.is_empty() {
        return rule.extensions().iter().any(|ext| ext == request_ext);
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if content_type.is_empty() {
        return false;
    }
    rule.extensions()
        .iter()
        .filter_map(|ext| registered_content_type(ext))
        .any(|ct| content_type.contains(ct))
}
