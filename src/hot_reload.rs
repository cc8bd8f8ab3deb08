//! # Template Hot Reload
//!
//! Watches the document root and drops cached templates when files change,
//! so edits show up on the next request without restarting the server.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use renderware::hot_reload::watch_templates;
//!
//! let views = rules.iter().map(|r| r.view().clone()).collect();
//! let watcher = watch_templates(&site_root, views, |path| {
//!     tracing::debug!(path = %path.display(), "template changed");
//! })?;
//!
//! // The watcher stops when dropped; keep it alive for the server's lifetime.
//! ```
//!
//! ## Reload Process
//!
//! 1. **Detection**: the filesystem watcher reports a create, modify or
//!    remove event somewhere below the document root.
//! 2. **Swap**: every [`TemplateView`] whose directory contains the changed
//!    path swaps in a fresh engine. Requests already rendering keep the engine
//!    they loaded.
//! 3. **Hook**: the callback runs with the changed path.
//!
//! A template that fails to parse after an edit is reported on the next
//! request that renders it; the watcher itself never fails a reload.
//!
//! Hot reload is meant for development. Production deployments should leave
//! it off.

use crate::render::TemplateView;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Watch `site_root` recursively and reload the affected `views` on change.
///
/// `on_reload` is called once per changed path after the views were reloaded.
pub fn watch_templates<P, F>(
    site_root: P,
    views: Vec<TemplateView>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&Path) + Send + 'static,
{
    let root: PathBuf = site_root.as_ref().to_path_buf();
    // Events report absolute paths; compare against canonical view dirs.
    let watched: Vec<(PathBuf, TemplateView)> = views
        .into_iter()
        .map(|view| {
            let dir = view
                .dir()
                .canonicalize()
                .unwrap_or_else(|_| view.dir().to_path_buf());
            (dir, view)
        })
        .collect();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for path in &event.paths {
                    let mut reloaded = 0usize;
                    for (dir, view) in &watched {
                        if path.starts_with(dir) {
                            view.reload();
                            reloaded += 1;
                        }
                    }
                    if reloaded > 0 {
                        info!(
                            path = %path.display(),
                            views = reloaded,
                            "hot-reload: templates reloaded"
                        );
                        on_reload(path);
                    }
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    Ok(watcher)
}
