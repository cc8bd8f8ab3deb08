use crate::error::FilterError;
use arc_swap::ArcSwap;
use minijinja::{path_loader, Environment, UndefinedBehavior, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Template loader scoped to one rule's directory.
///
/// Templates are loaded from disk on first use and cached by the engine.
/// Clones share the same engine, so [`reload`](Self::reload) on any clone
/// drops the cache for all of them.
#[derive(Clone)]
pub struct TemplateView {
    dir: PathBuf,
    env: Arc<ArcSwap<Environment<'static>>>,
}

impl fmt::Debug for TemplateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateView").field("dir", &self.dir).finish()
    }
}

impl TemplateView {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();
        let env = Arc::new(ArcSwap::from_pointee(build_environment(&dir)));
        Self { dir, env }
    }

    /// Directory template names are resolved against.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Swap in a fresh engine so templates are re-read from disk.
    pub fn reload(&self) {
        self.env.store(Arc::new(build_environment(&self.dir)));
    }

    /// Load and parse `name` without rendering it.
    pub fn check(&self, name: &str) -> Result<(), FilterError> {
        let env = self.env.load_full();
        env.get_template(name)
            .map(|_| ())
            .map_err(|source| FilterError::TemplateLookup {
                name: name.to_string(),
                source,
            })
    }

    /// Names of every file below the view directory whose name ends with one
    /// of `extensions`, sorted.
    pub fn template_names(&self, extensions: &[String]) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        collect_templates(&self.dir, "", extensions, &mut names)?;
        names.sort();
        Ok(names)
    }

    /// Render `name` with `ctx`, appending the output to `out`.
    ///
    /// On error `out` may hold partial output; callers discard it.
    pub fn render_to(&self, name: &str, ctx: &Value, out: &mut Vec<u8>) -> Result<(), FilterError> {
        let env = self.env.load_full();
        let template = env
            .get_template(name)
            .map_err(|source| FilterError::TemplateLookup {
                name: name.to_string(),
                source,
            })?;
        template
            .render_to_write(ctx, &mut *out)
            .map(|_| ())
            .map_err(|source| FilterError::TemplateExecution {
                name: name.to_string(),
                source,
            })
    }
}

fn collect_templates(
    dir: &Path,
    prefix: &str,
    extensions: &[String],
    names: &mut Vec<String>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let name = if prefix.is_empty() {
            file_name.clone()
        } else {
            format!("{prefix}/{file_name}")
        };
        if entry.file_type()?.is_dir() {
            collect_templates(&entry.path(), &name, extensions, names)?;
        } else if extensions.iter().any(|ext| file_name.ends_with(ext.as_str())) {
            names.push(name);
        }
    }
    Ok(())
}

fn build_environment(dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(dir.to_path_buf()));
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}
