use super::handler::Request;
use may_minihttp::Request as RawRequest;
use std::io::{self, Read};
use tracing::debug;

/// Convert a may_minihttp request into the chain's [`Request`].
///
/// Header names or values that are not valid HTTP tokens make the whole
/// request invalid.
pub fn into_http_request(req: RawRequest) -> io::Result<Request> {
    let mut builder = http::Request::builder()
        .method(req.method())
        .uri(req.path());
    for h in req.headers() {
        builder = builder.header(h.name, h.value);
    }
    let header_count = req.headers().len();

    let mut body = Vec::new();
    req.body().read_to_end(&mut body)?;

    let request = builder
        .body(body)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    debug!(
        method = %request.method(),
        path = %request.uri().path(),
        headers_count = header_count,
        body_size_bytes = request.body().len(),
        "Request parsed"
    );
    Ok(request)
}
