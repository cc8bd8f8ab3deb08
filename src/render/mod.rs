//! Template rendering for buffered requests.
//!
//! A matched, buffered request is resolved to a template file below the
//! document root, then executed by the rule's [`TemplateView`] against a
//! [`RenderContext`] built for that request.

mod context;
mod helpers;
mod view;

pub use context::{RenderContext, RequestInfo, SiteFiles};
pub use helpers::{HelperFn, TemplateHelpers};
pub use view::TemplateView;

use crate::error::FilterError;
use crate::rule::Rule;
use crate::server::Request;
use crate::static_files::{decode_path, safe_join};
use http::HeaderMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Render the template addressed by `req` into `out`.
///
/// `headers` are the response headers staged by the next handler and are
/// exposed to the template. `out` is cleared first and cleared again on
/// failure. Returns the template file the output came from.
pub fn render(
    site_root: &Path,
    rule: &Rule,
    req: &Request,
    headers: &HeaderMap,
    helpers: &TemplateHelpers,
    out: &mut Vec<u8>,
) -> Result<PathBuf, FilterError> {
    let path = resolve_template(site_root, rule, req.uri().path())?;
    let name = template_name(rule.view().dir(), &path).ok_or_else(|| {
        FilterError::PathEscapesRoot {
            path: req.uri().path().to_string(),
        }
    })?;
    debug!(template = %name, view = %rule.view().dir().display(), "Rendering template");

    let ctx = RenderContext::new(req, headers, SiteFiles::new(rule.view().dir())).into_value(helpers);
    out.clear();
    if let Err(err) = rule.view().render_to(&name, &ctx, out) {
        out.clear();
        return Err(err);
    }
    Ok(path)
}

/// Map a request path to a file under `site_root`, resolving directories to
/// the rule's first existing index file.
fn resolve_template(site_root: &Path, rule: &Rule, url_path: &str) -> Result<PathBuf, FilterError> {
    let escapes = || FilterError::PathEscapesRoot {
        path: url_path.to_string(),
    };
    let decoded = decode_path(url_path).ok_or_else(escapes)?;
    let path = safe_join(site_root, &decoded).ok_or_else(escapes)?;
    if !path.is_dir() {
        return Ok(path);
    }
    let index = rule
        .index_files()
        .iter()
        .map(|file| path.join(file))
        .find(|candidate| candidate.is_file());
    Ok(match index {
        Some(found) => found,
        // Nothing to render; the lookup reports the first candidate as missing.
        None => path.join(rule.index_files().first().map(String::as_str).unwrap_or("index.html")),
    })
}

/// Slash-joined name of `path` relative to `view_dir`.
fn template_name(view_dir: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(view_dir).ok()?;
    let mut parts = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(s) => parts.push(s.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
