//! Host side of the handler chain: the [`Handler`]/[`ResponseWriter`]
//! contract, final content serving, and the may_minihttp bridge that runs a
//! chain for real connections.

mod content;
mod handler;
mod http_server;
mod request;
mod response;
mod service;

pub use content::{content_type_for, serve_content};
pub(crate) use handler::set_header;
pub use handler::{respond, Handler, HandlerResult, Request, ResponseRecorder, ResponseWriter};
pub use http_server::{HttpServer, ServerHandle};
pub use request::into_http_request;
pub use response::write_recorded;
pub use service::FilterService;
