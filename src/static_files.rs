//! Static file serving from the document root.
//!
//! [`StaticFiles`] is the usual last link of the chain: it maps the request
//! path onto the document root, resolves directories to their index files and
//! writes the file through [`serve_content`]. The same traversal-safe join,
//! [`safe_join`], is used by the render path and the template file view.

use crate::error::FilterError;
use crate::server::{serve_content, Handler, HandlerResult, Request, ResponseWriter};
use http::{Method, StatusCode};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// Join a slash-separated relative path onto `base`.
///
/// Only plain components are accepted; `..`, root or prefix components, and
/// names containing a backslash all yield `None`.
#[must_use]
pub fn safe_join(base: &Path, rel: &str) -> Option<PathBuf> {
    let mut pb = base.to_path_buf();
    for comp in Path::new(rel.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(s) => {
                if s.to_string_lossy().contains('\\') {
                    return None;
                }
                pb.push(s)
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(pb)
}

/// Percent-decode a URL path. Invalid UTF-8 after decoding is rejected.
pub(crate) fn decode_path(url_path: &str) -> Option<String> {
    urlencoding::decode(url_path).ok().map(|p| p.into_owned())
}

/// File server rooted at a document root.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
    index_files: Vec<String>,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
            index_files: vec!["index.html".to_string()],
        }
    }

    /// Replace the index files tried, in order, for directory requests.
    #[must_use]
    pub fn with_index_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_files = files.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn index_files(&self) -> &[String] {
        &self.index_files
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let decoded = decode_path(url_path)?;
        let path = safe_join(&self.base_dir, &decoded)?;
        if path.is_dir() {
            return self
                .index_files
                .iter()
                .map(|index| path.join(index))
                .find(|candidate| candidate.is_file());
        }
        Some(path)
    }

    /// Read the file behind `url_path` with its content type.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, String)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, crate::server::content_type_for(&path)))
    }
}

impl Handler for StaticFiles {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(Some(StatusCode::METHOD_NOT_ALLOWED));
        }
        let path = match self.map_path(req.uri().path()) {
            Some(p) if p.is_file() => p,
            _ => {
                trace!(path = %req.uri().path(), "Static file not found");
                return Ok(Some(StatusCode::NOT_FOUND));
            }
        };
        let (bytes, modified) = match fs::read(&path) {
            Ok(bytes) => (bytes, fs::metadata(&path).and_then(|m| m.modified()).ok()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Ok(Some(StatusCode::FORBIDDEN));
            }
            Err(e) => return Err(FilterError::Io(e)),
        };
        debug!(file = %path.display(), size = bytes.len(), "Serving static file");
        serve_content(w, req, &path, modified, StatusCode::OK, &bytes)?;
        Ok(None)
    }
}
