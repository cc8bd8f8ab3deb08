//! Rule configuration: the YAML file format and one-line rule directives.
//!
//! ```yaml
//! site_root: ./site
//! rules:
//!   - path: /photos
//!     ext: [.html]
//!   - {}            # path "/", default extensions
//! ```
//!
//! A directive is the same rule written on one line, as accepted by the
//! `--rule` command line flag: `"/photos .html .htm"`.

use crate::error::ConfigError;
use crate::rule::{Rule, RuleSet, DEFAULT_ROOT};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One rule as written in configuration.
///
/// Missing fields take the rule defaults; an explicitly empty `ext` list is
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub ext: Option<Vec<String>>,
}

impl RuleConfig {
    /// Parse a `"<path> [ext...]"` directive. An empty directive is the
    /// default rule.
    pub fn parse_directive(directive: &str) -> Result<Self, ConfigError> {
        let mut fields = directive.split_whitespace();
        let path = fields.next().map(str::to_string);
        let ext: Vec<String> = fields.map(str::to_string).collect();
        let rule = Self {
            path,
            ext: if ext.is_empty() { None } else { Some(ext) },
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = self.root();
        if !root.starts_with('/') {
            return Err(ConfigError::InvalidRoot {
                root: root.to_string(),
            });
        }
        if let Some(ext) = &self.ext {
            if ext.is_empty() {
                return Err(ConfigError::EmptyExtensions {
                    root: root.to_string(),
                });
            }
            if let Some(bad) = ext.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
                return Err(ConfigError::InvalidExtension { ext: bad.clone() });
            }
        }
        Ok(())
    }

    /// The configured root, or `/` when none is given.
    #[must_use]
    pub fn root(&self) -> &str {
        match self.path.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => DEFAULT_ROOT,
        }
    }

    /// Validate and build the rule, loading templates below `site_root`.
    pub fn build(&self, site_root: &Path) -> Result<Rule, ConfigError> {
        self.validate()?;
        Ok(Rule::new(
            self.root(),
            self.ext.clone().unwrap_or_default(),
            site_root,
        ))
    }
}

impl FromStr for RuleConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_directive(s)
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Document root templates and static files are served from
    pub site_root: PathBuf,
    /// Rules in match order. Absent means a single default rule; an empty
    /// list means no rules.
    #[serde(default)]
    pub rules: Option<Vec<RuleConfig>>,
}

impl FilterConfig {
    /// Configuration with the given document root and default rules.
    pub fn new<P: Into<PathBuf>>(site_root: P) -> Self {
        Self {
            site_root: site_root.into(),
            rules: None,
        }
    }

    /// Read and parse a YAML configuration file.
    ///
    /// A relative `site_root` is resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        if config.site_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.site_root = dir.join(&config.site_root);
            }
        }
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        for rule in config.rules.iter().flatten() {
            rule.validate()?;
        }
        Ok(config)
    }

    /// Append rules parsed from directives, after any configured ones.
    pub fn push_directives<I, S>(&mut self, directives: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for directive in directives {
            let rule = RuleConfig::parse_directive(directive.as_ref())?;
            self.rules.get_or_insert_with(Vec::new).push(rule);
        }
        Ok(())
    }

    /// Build the rule set. The document root must be an existing directory.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        if !self.site_root.is_dir() {
            return Err(ConfigError::MissingSiteRoot {
                path: self.site_root.display().to_string(),
            });
        }
        let rules = match &self.rules {
            None => vec![RuleConfig::default().build(&self.site_root)?],
            Some(rules) => rules
                .iter()
                .map(|rule| rule.build(&self.site_root))
                .collect::<Result<_, _>>()?,
        };
        Ok(RuleSet::new(rules))
    }
}
