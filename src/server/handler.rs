use crate::error::FilterError;
use http::{HeaderMap, HeaderValue, StatusCode};
use std::io;
use tracing::{error, warn};

/// Request descriptor passed down the handler chain.
pub type Request = http::Request<Vec<u8>>;

/// Result of a handler invocation.
///
/// `Ok(None)` means the response was fully written. `Ok(Some(status))` asks the
/// host to answer with a default response for `status`. Errors are reported by
/// the host's error path.
pub type HandlerResult = Result<Option<StatusCode>, FilterError>;

/// Response sink a handler writes into.
///
/// Headers are staged through [`headers_mut`](Self::headers_mut) until
/// [`write_head`](Self::write_head) commits them together with the status. A
/// body write without a prior `write_head` implies `200 OK`.
pub trait ResponseWriter {
    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;
    fn write_head(&mut self, status: StatusCode);
    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// A link in the middleware chain.
pub trait Handler: Send + Sync {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync,
{
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        self(w, req)
    }
}

/// In-memory [`ResponseWriter`] that records everything written to it.
///
/// Headers are snapshotted when the head is written, so later mutations of
/// the staged map are not part of the recorded response.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    staged: HeaderMap,
    head: Option<(StatusCode, HeaderMap)>,
    body: Vec<u8>,
}

impl ResponseRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a status line has been committed.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.head.is_some()
    }

    /// Recorded status, `200 OK` when nothing was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.head
            .as_ref()
            .map(|(status, _)| *status)
            .unwrap_or(StatusCode::OK)
    }

    /// Headers as committed with the status line (or the staged map if the
    /// head was never written).
    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        self.head
            .as_ref()
            .map(|(_, headers)| headers)
            .unwrap_or(&self.staged)
    }

    /// Convenience accessor for a single committed header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response_headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        let status = self.status();
        let headers = match self.head {
            Some((_, headers)) => headers,
            None => self.staged,
        };
        (status, headers, self.body)
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers(&self) -> &HeaderMap {
        &self.staged
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.staged
    }

    fn write_head(&mut self, status: StatusCode) {
        if let Some((existing, _)) = &self.head {
            warn!(
                existing = existing.as_u16(),
                ignored = status.as_u16(),
                "Superfluous write_head call ignored"
            );
            return;
        }
        self.head = Some((status, self.staged.clone()));
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.head.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}

/// Run `handler` for `req` and apply the host's outcome rules.
///
/// Handlers that ask for a status, or fail, before writing anything get an
/// empty-bodied response with that status. Errors are logged here and go no
/// further.
pub fn respond(handler: &dyn Handler, req: &Request) -> ResponseRecorder {
    let mut rec = ResponseRecorder::new();
    match handler.serve(&mut rec, req) {
        Ok(None) => {}
        Ok(Some(status)) => {
            if !rec.is_written() {
                rec.headers_mut().clear();
                rec.write_head(status);
            }
        }
        Err(err) => {
            error!(
                method = %req.method(),
                path = %req.uri().path(),
                error = %err,
                "Request failed"
            );
            if !rec.is_written() {
                rec.headers_mut().clear();
                rec.write_head(err.status());
            }
        }
    }
    if !rec.is_written() {
        rec.write_head(StatusCode::OK);
    }
    rec
}

/// Set a header from a string value, skipping values that are not valid
/// header text.
pub(crate) fn set_header(headers: &mut HeaderMap, name: http::header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => warn!(header = %name, value = %value, "Invalid header value dropped"),
    }
}
