use super::handler::{set_header, Request, ResponseWriter};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use http::{Method, StatusCode};
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Content type for a file name, with an explicit UTF-8 charset for text.
#[must_use]
pub fn content_type_for(name: &Path) -> String {
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT
        || mime.essence_str() == "application/javascript"
    {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}

/// Write `body` as the complete response.
///
/// `name` only drives the `Content-Type` default; headers already staged on
/// `w` win. A `modified` time turns on `Last-Modified` and `If-Modified-Since`
/// handling for successful GET/HEAD responses. HEAD requests get the headers
/// without the body.
pub fn serve_content(
    w: &mut dyn ResponseWriter,
    req: &Request,
    name: &Path,
    modified: Option<SystemTime>,
    status: StatusCode,
    body: &[u8],
) -> io::Result<()> {
    if !w.headers().contains_key(CONTENT_TYPE) {
        let ct = content_type_for(name);
        set_header(w.headers_mut(), CONTENT_TYPE, &ct);
    }

    let modified = modified.filter(|t| *t > UNIX_EPOCH);
    if let Some(t) = modified {
        set_header(w.headers_mut(), LAST_MODIFIED, &httpdate::fmt_http_date(t));
    }

    let cacheable = status.is_success() && (req.method() == Method::GET || req.method() == Method::HEAD);
    if cacheable && not_modified(req, modified) {
        debug!(name = %name.display(), "Content not modified since client copy");
        let headers = w.headers_mut();
        headers.remove(CONTENT_TYPE);
        headers.remove(CONTENT_LENGTH);
        w.write_head(StatusCode::NOT_MODIFIED);
        return Ok(());
    }

    set_header(w.headers_mut(), CONTENT_LENGTH, &body.len().to_string());
    w.write_head(status);
    if req.method() != Method::HEAD {
        w.write_body(body)?;
    }
    Ok(())
}

fn not_modified(req: &Request, modified: Option<SystemTime>) -> bool {
    let Some(modified) = modified else {
        return false;
    };
    let Some(since) = req
        .headers()
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
    else {
        return false;
    };
    // HTTP dates carry whole seconds only.
    let secs = |t: SystemTime| t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    secs(modified) <= secs(since)
}
