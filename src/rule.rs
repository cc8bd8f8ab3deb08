//! Rendering rules and first-match rule selection.

use crate::render::TemplateView;
use std::path::Path;

/// Rule root that matches every request path.
pub const DEFAULT_ROOT: &str = "/";

/// Extensions rendered when a rule does not list its own.
pub const DEFAULT_EXTENSIONS: [&str; 3] = [".html", ".htm", ".jinja"];

/// A path scope whose matching requests are rendered as templates.
///
/// A request is rendered by this rule when its path lies under `root` and it
/// asks for one of `extensions` (or, for extensionless paths, the upstream
/// response carries one of their content types).
#[derive(Debug, Clone)]
pub struct Rule {
    root: String,
    extensions: Vec<String>,
    index_files: Vec<String>,
    view: TemplateView,
}

impl Rule {
    /// Build a rule whose templates load from `site_root` joined with `root`.
    ///
    /// An empty `root` becomes [`DEFAULT_ROOT`] and an empty extension list
    /// becomes [`DEFAULT_EXTENSIONS`].
    pub fn new<S: Into<String>>(root: S, extensions: Vec<String>, site_root: &Path) -> Self {
        let mut root = root.into();
        if root.is_empty() {
            root = DEFAULT_ROOT.to_string();
        }
        let extensions = if extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            extensions
        };
        let index_files = extensions.iter().map(|ext| format!("index{ext}")).collect();
        let view = TemplateView::new(site_root.join(root.trim_start_matches('/')));
        Self {
            root,
            extensions,
            index_files,
            view,
        }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// `index<ext>` for every extension, in the same order.
    #[must_use]
    pub fn index_files(&self) -> &[String] {
        &self.index_files
    }

    #[must_use]
    pub fn view(&self) -> &TemplateView {
        &self.view
    }

    /// Whether `path` lies inside this rule's scope.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        path_in_scope(path, &self.root)
    }
}

/// Segment-aware prefix test: `/photos` contains `/photos` and `/photos/a`
/// but not `/photosets`. The root `/` contains everything.
#[must_use]
pub fn path_in_scope(path: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return true;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Ordered rules, first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The first rule, in declaration order, whose scope contains `path`.
    #[must_use]
    pub fn matching(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Index files of every rule, first occurrence order, without duplicates.
    #[must_use]
    pub fn index_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for file in self.rules.iter().flat_map(|r| r.index_files.iter()) {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
        files
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
