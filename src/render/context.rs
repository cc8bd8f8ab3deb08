use super::helpers::TemplateHelpers;
use crate::server::Request;
use crate::static_files::safe_join;
use http::HeaderMap;
use minijinja::value::{from_args, Object, ObjectRepr, Value};
use minijinja::{Error, ErrorKind, State};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Request details exposed to templates as `req`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub host: Option<String>,
}

impl RequestInfo {
    #[must_use]
    pub fn from_request(req: &Request) -> Self {
        let query = req
            .uri()
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let host = req
            .uri()
            .host()
            .map(str::to_string)
            .or_else(|| {
                req.headers()
                    .get(http::header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            });
        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query,
            headers: header_snapshot(req.headers()),
            host,
        }
    }
}

/// Flatten a header map; repeated headers are joined with `", "`.
fn header_snapshot(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    out
}

/// Per-request values a template is executed against.
///
/// Templates see `headers` (response headers staged upstream), `req`, `url`,
/// `root` (a read-only view of the rule's directory) and every registered
/// helper function by name.
#[derive(Debug)]
pub struct RenderContext {
    headers: BTreeMap<String, String>,
    req: RequestInfo,
    url: String,
    root: SiteFiles,
}

impl RenderContext {
    pub fn new(req: &Request, response_headers: &HeaderMap, root: SiteFiles) -> Self {
        Self {
            headers: header_snapshot(response_headers),
            req: RequestInfo::from_request(req),
            url: req.uri().to_string(),
            root,
        }
    }

    /// Consume the context into the engine's root value, binding `helpers`.
    ///
    /// Helpers never replace the built-in names.
    #[must_use]
    pub fn into_value(self, helpers: &TemplateHelpers) -> Value {
        let mut vars: BTreeMap<String, Value> = BTreeMap::new();
        vars.insert("headers".to_string(), Value::from_serialize(&self.headers));
        vars.insert("req".to_string(), Value::from_serialize(&self.req));
        vars.insert("url".to_string(), Value::from(self.url));
        vars.insert("root".to_string(), Value::from_object(self.root));
        for (name, func) in helpers.bind() {
            if vars.contains_key(&name) {
                debug!(helper = %name, "Helper shadows a context variable and is skipped");
                continue;
            }
            vars.insert(name, func);
        }
        Value::from(vars)
    }
}

/// Read-only file access for templates, confined to one directory.
///
/// Exposed as `root` with `read(path)`, `exists(path)` and `list(dir)`.
#[derive(Debug, Clone)]
pub struct SiteFiles {
    dir: PathBuf,
}

impl SiteFiles {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf, Error> {
        safe_join(&self.dir, rel).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("path '{rel}' is outside the template root"),
            )
        })
    }

    fn read(&self, rel: &str) -> Result<Value, Error> {
        let path = self.resolve(rel)?;
        fs::read_to_string(&path).map(Value::from).map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, format!("cannot read '{rel}'")).with_source(e)
        })
    }

    fn exists(&self, rel: &str) -> Result<Value, Error> {
        Ok(Value::from(self.resolve(rel)?.exists()))
    }

    fn list(&self, rel: &str) -> Result<Value, Error> {
        let path = self.resolve(rel)?;
        let entries = fs::read_dir(&path).map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, format!("cannot list '{rel}'")).with_source(e)
        })?;
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(Value::from(names))
    }
}

impl Object for SiteFiles {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "read" => {
                let (path,): (&str,) = from_args(args)?;
                self.read(path)
            }
            "exists" => {
                let (path,): (&str,) = from_args(args)?;
                self.exists(path)
            }
            "list" => {
                let (path,): (Option<&str>,) = from_args(args)?;
                self.list(path.unwrap_or(""))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("root has no method named {method}"),
            )),
        }
    }
}
