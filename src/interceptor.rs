//! Response interception for matched requests.
//!
//! [`BufferedResponse`] stands in for the real sink while the next handler
//! runs. Headers are staged locally; the first `write_head` (or body write)
//! runs the buffering decision exactly once. A declined decision copies the
//! staged head to the real sink and turns the wrapper transparent. An
//! accepted decision keeps everything, head and body, away from the real sink
//! so the caller can replace it with rendered output.

use crate::server::ResponseWriter;
use http::{HeaderMap, StatusCode};
use std::io;
use tracing::debug;

/// Where the interceptor stands on buffering for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Nothing has been written yet
    Undecided,
    /// The response is captured in the buffer
    Buffering,
    /// The response goes straight to the real sink
    Passthrough,
}

/// Wrapper around the real sink that can hold back the response.
pub struct BufferedResponse<'a, F>
where
    F: FnOnce(StatusCode, &HeaderMap) -> bool,
{
    inner: &'a mut dyn ResponseWriter,
    buffer: &'a mut Vec<u8>,
    decide: Option<F>,
    state: BufferState,
    status: StatusCode,
    headers: HeaderMap,
}

impl<'a, F> BufferedResponse<'a, F>
where
    F: FnOnce(StatusCode, &HeaderMap) -> bool,
{
    pub fn new(buffer: &'a mut Vec<u8>, inner: &'a mut dyn ResponseWriter, decide: F) -> Self {
        Self {
            inner,
            buffer,
            decide: Some(decide),
            state: BufferState::Undecided,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Whether the decision ran and chose to capture the response.
    #[must_use]
    pub fn was_buffered(&self) -> bool {
        self.state == BufferState::Buffering
    }

    /// Body bytes captured so far.
    #[must_use]
    pub fn buffered_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Status written by the next handler (`200 OK` if none was).
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Copy the staged headers onto the wrapped sink, replacing any values it
    /// already holds for the same names.
    pub fn copy_headers(&mut self) {
        copy_headers(&self.headers, self.inner.headers_mut());
    }

    /// Release the borrows of the sink and buffer, keeping what was captured.
    #[must_use]
    pub fn into_parts(self) -> Intercepted {
        Intercepted {
            state: self.state,
            status: self.status,
            headers: self.headers,
        }
    }
}

impl<F> ResponseWriter for BufferedResponse<'_, F>
where
    F: FnOnce(StatusCode, &HeaderMap) -> bool,
{
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        let Some(decide) = self.decide.take() else {
            return;
        };
        self.status = status;
        if decide(status, &self.headers) {
            debug!(status = status.as_u16(), "Buffering response for rendering");
            self.state = BufferState::Buffering;
            return;
        }
        debug!(status = status.as_u16(), "Response passes through unbuffered");
        self.state = BufferState::Passthrough;
        copy_headers(&self.headers, self.inner.headers_mut());
        self.inner.write_head(status);
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.state == BufferState::Undecided {
            self.write_head(StatusCode::OK);
        }
        match self.state {
            BufferState::Buffering => {
                self.buffer.extend_from_slice(chunk);
                Ok(())
            }
            _ => self.inner.write_body(chunk),
        }
    }
}

/// What the interceptor captured, detached from the sink and buffer.
#[derive(Debug, Clone)]
pub struct Intercepted {
    pub state: BufferState,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Intercepted {
    #[must_use]
    pub fn was_buffered(&self) -> bool {
        self.state == BufferState::Buffering
    }

    /// Copy the captured headers (not the status) onto `sink`.
    pub fn copy_headers_into(&self, sink: &mut dyn ResponseWriter) {
        copy_headers(&self.headers, sink.headers_mut());
    }
}

fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for name in from.keys() {
        to.remove(name);
        for value in from.get_all(name) {
            to.append(name.clone(), value.clone());
        }
    }
}
