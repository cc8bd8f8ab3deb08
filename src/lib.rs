//! # renderware
//!
//! **renderware** is a template-rendering response filter for HTTP handler
//! chains, built on the `may` coroutine runtime and `may_minihttp`.
//!
//! ## Overview
//!
//! The filter sits in front of another handler (usually a static file
//! server). For requests covered by one of its rules it lets the next handler
//! run against a buffering response wrapper. If the response turns out to be
//! a template (by request extension, or by content type for extensionless
//! paths), the captured body is thrown away and the template at the request
//! path is rendered with [`minijinja`] and served instead, with
//! `Content-Length` matching the rendered bytes. Everything else passes
//! through untouched.
//!
//! ## Architecture
//!
//! - **[`rule`]** - Rules and first-match rule selection
//! - **[`buffering`]** - The buffer-or-stream decision
//! - **[`interceptor`]** - The response wrapper that holds a response back
//! - **[`render`]** - Template resolution, the per-request context and template views
//! - **[`filter`]** - [`TemplateFilter`], tying the above together per request
//! - **[`pool`]** - Reusable response buffers
//! - **[`server`]** - The handler contract, content serving and the HTTP host
//! - **[`static_files`]** - Static file handler used as the chain's last link
//! - **[`config`]** - YAML configuration and rule directives
//! - **[`hot_reload`]** - Template reloading on file changes
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(may_minihttp)
//!     participant Filter as TemplateFilter
//!     participant Wrapper as BufferedResponse
//!     participant Next as StaticFiles
//!     participant View as TemplateView
//!
//!     Client->>Server: GET /photos/test.html
//!     Server->>Filter: serve(recorder, request)
//!     Filter->>Filter: RuleSet::matching("/photos/test.html")
//!     alt no rule matches
//!         Filter->>Next: serve(recorder, request)
//!         Next-->>Client: file bytes
//!     else rule matches
//!         Filter->>Wrapper: wrap recorder + pooled buffer
//!         Filter->>Next: serve(wrapper, request)
//!         Next->>Wrapper: write_head(200) / write_body(..)
//!         Wrapper->>Wrapper: should_buffer(rule, ".html", ..)
//!         alt buffered
//!             Filter->>View: render("test.html", context)
//!             View-->>Filter: rendered bytes
//!             Filter-->>Client: rendered body, Content-Length
//!         else passthrough
//!             Wrapper-->>Client: original response
//!         end
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use renderware::{FilterService, HttpServer, RuleSet, Rule, StaticFiles, TemplateFilter};
//! use std::sync::Arc;
//!
//! let rules = RuleSet::new(vec![Rule::new("/", vec![".html".into()], "site".as_ref())]);
//! let files = StaticFiles::new("site").with_index_files(rules.index_files());
//! let filter = TemplateFilter::new(Arc::new(files), "site", rules);
//! let handle = HttpServer(FilterService::new(Arc::new(filter))).start("127.0.0.1:8080")?;
//! handle.join().ok();
//! ```
//!
//! Templates see the staged response `headers`, the request as `req`
//! (`method`, `path`, `query`, `headers`, `host`), the request `url`, a
//! read-only `root` file view (`root.read`, `root.exists`, `root.list`) and
//! any functions registered through [`TemplateHelpers`].

pub mod buffering;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod hot_reload;
pub mod interceptor;
pub mod logging;
pub mod pool;
pub mod render;
pub mod rule;
pub mod runtime_config;
pub mod server;
pub mod static_files;

pub use config::{FilterConfig, RuleConfig};
pub use error::{ConfigError, FilterError};
pub use filter::TemplateFilter;
pub use interceptor::{BufferState, BufferedResponse, Intercepted};
pub use pool::{BufferPool, PooledBuffer};
pub use render::{RenderContext, SiteFiles, TemplateHelpers, TemplateView};
pub use rule::{Rule, RuleSet};
pub use server::{
    respond, FilterService, Handler, HandlerResult, HttpServer, Request, ResponseRecorder,
    ResponseWriter, ServerHandle,
};
pub use static_files::StaticFiles;
