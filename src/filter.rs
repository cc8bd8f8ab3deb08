//! The template filter: the link in the handler chain that turns matched
//! responses into rendered templates.

use crate::buffering::{request_extension, should_buffer};
use crate::interceptor::BufferedResponse;
use crate::pool::BufferPool;
use crate::render::{render, TemplateHelpers};
use crate::rule::RuleSet;
use crate::server::{serve_content, set_header, Handler, HandlerResult, Request, ResponseWriter};
use crate::static_files::decode_path;
use http::header::{CONTENT_LENGTH, LAST_MODIFIED};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Renders templates for requests covered by a [`RuleSet`].
///
/// Requests outside every rule go straight to `next`. Matched requests run
/// `next` against a [`BufferedResponse`]; when the buffering decision holds
/// the response back, the captured body is discarded and the template at the
/// request path is rendered and served in its place.
pub struct TemplateFilter {
    next: Arc<dyn Handler>,
    site_root: PathBuf,
    rules: RuleSet,
    pool: Arc<BufferPool>,
    helpers: TemplateHelpers,
}

impl TemplateFilter {
    pub fn new<P: Into<PathBuf>>(next: Arc<dyn Handler>, site_root: P, rules: RuleSet) -> Self {
        Self {
            next,
            site_root: site_root.into(),
            rules,
            pool: Arc::new(BufferPool::default()),
            helpers: TemplateHelpers::default(),
        }
    }

    /// Share a buffer pool with other filters.
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Functions made available to every template this filter renders.
    #[must_use]
    pub fn with_helpers(mut self, helpers: TemplateHelpers) -> Self {
        self.helpers = helpers;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn site_root(&self) -> &Path {
        &self.site_root
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }
}

impl Handler for TemplateFilter {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        // Match on the decoded path, the same one the next handler and the
        // renderer resolve against.
        let Some(decoded) = decode_path(req.uri().path()) else {
            trace!(path = %req.uri().path(), "Undecodable path, passing through");
            return self.next.serve(w, req);
        };
        let path = decoded.as_str();
        let Some(rule) = self.rules.matching(path) else {
            trace!(path = %path, "No rule matches, passing through");
            return self.next.serve(w, req);
        };
        debug!(path = %path, rule_root = %rule.root(), "Rule matched");

        let mut buf = self.pool.acquire();
        let ext = request_extension(path);
        let (result, captured) = {
            let mut rb = BufferedResponse::new(&mut buf, &mut *w, |status, headers| {
                should_buffer(rule, ext, status, headers)
            });
            let result = self.next.serve(&mut rb, req);
            (result, rb.into_parts())
        };

        if !captured.was_buffered() {
            return result;
        }
        result?;

        if !captured.status.is_success() {
            debug!(
                path = %path,
                status = captured.status.as_u16(),
                "Buffered response is not a success, flushing it unchanged"
            );
            captured.copy_headers_into(w);
            w.write_head(captured.status);
            w.write_body(&buf)?;
            return Ok(None);
        }

        buf.clear();
        let template = render(
            &self.site_root,
            rule,
            req,
            &captured.headers,
            &self.helpers,
            &mut buf,
        )?;

        captured.copy_headers_into(w);
        set_header(w.headers_mut(), CONTENT_LENGTH, &buf.len().to_string());
        let modified = w
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok());
        info!(
            path = %path,
            template = %template.display(),
            status = captured.status.as_u16(),
            bytes = buf.len(),
            "Rendered template"
        );
        serve_content(w, req, &template, modified, captured.status, &buf)?;
        Ok(None)
    }
}
