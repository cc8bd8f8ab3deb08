use super::handler::{respond, Handler};
use super::request::into_http_request;
use super::response::write_recorded;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::warn;

/// may_minihttp service that runs every request through a handler chain.
#[derive(Clone)]
pub struct FilterService {
    handler: Arc<dyn Handler>,
}

impl FilterService {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

impl HttpService for FilterService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let req = match into_http_request(req) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "Rejecting malformed request");
                res.status_code(400, "Bad Request");
                return Ok(());
            }
        };
        let rec = respond(self.handler.as_ref(), &req);
        write_recorded(res, rec);
        Ok(())
    }
}
