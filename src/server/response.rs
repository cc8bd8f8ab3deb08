use super::handler::ResponseRecorder;
use dashmap::DashMap;
use http::header::CONTENT_LENGTH;
use http::{HeaderName, HeaderValue, StatusCode};
use may_minihttp::Response;
use once_cell::sync::Lazy;
use tracing::warn;

/// may_minihttp only accepts `'static` header lines. Each distinct line is
/// leaked once and reused afterwards.
static HEADER_LINES: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);

fn intern(line: String) -> &'static str {
    if let Some(existing) = HEADER_LINES.get(&line) {
        return *existing;
    }
    let key = line.clone();
    *HEADER_LINES
        .entry(key)
        .or_insert_with(|| Box::leak(line.into_boxed_str()))
}

/// `Name: value` line for a header, or `None` if the value is not text.
fn header_line(name: &HeaderName, value: &HeaderValue) -> Option<String> {
    let value = value.to_str().ok()?;
    Some(format!("{}: {}", canonical_name(name.as_str()), value))
}

/// `content-type` becomes `Content-Type`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Copy a recorded response onto the wire.
///
/// `Content-Length` is left to may_minihttp, which always writes one derived
/// from the body. A recorded value would go out as a second header, so it is
/// dropped. HEAD responses therefore carry `Content-Length: 0` on the wire
/// rather than the length of the body a GET would return.
pub fn write_recorded(res: &mut Response, rec: ResponseRecorder) {
    let (status, headers, body) = rec.into_parts();
    res.status_code(usize::from(status.as_u16()), status_reason(status));
    for (name, value) in &headers {
        if name == CONTENT_LENGTH {
            continue;
        }
        match header_line(name, value) {
            Some(line) => {
                res.header(intern(line));
            }
            None => warn!(header = %name, "Non-text header value dropped"),
        }
    }
    res.body_vec(body);
}
