use http::StatusCode;
use std::fmt;
use std::io;

/// Failure raised while serving a request through the filter chain.
///
/// Every variant is reported to the host as `500 Internal Server Error`; the
/// underlying cause is kept so the host's error path can log it.
#[derive(Debug)]
pub enum FilterError {
    /// The resolved template path would leave the document root
    PathEscapesRoot {
        /// Request path as received
        path: String,
    },
    /// The template could not be found or failed to parse
    TemplateLookup {
        /// Template name relative to the rule's view directory
        name: String,
        source: minijinja::Error,
    },
    /// The template parsed but failed while executing
    TemplateExecution {
        /// Template name relative to the rule's view directory
        name: String,
        source: minijinja::Error,
    },
    /// I/O failure from a response sink or the file system
    Io(io::Error),
}

impl FilterError {
    /// Status code the host should answer with when nothing was written yet.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::PathEscapesRoot { path } => {
                write!(f, "request path '{path}' escapes the document root")
            }
            FilterError::TemplateLookup { name, source } => {
                write!(f, "failed to load template '{name}': {source}")
            }
            FilterError::TemplateExecution { name, source } => {
                write!(f, "failed to render template '{name}': {source}")
            }
            FilterError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::TemplateLookup { source, .. }
            | FilterError::TemplateExecution { source, .. } => Some(source),
            FilterError::Io(e) => Some(e),
            FilterError::PathEscapesRoot { .. } => None,
        }
    }
}

impl From<io::Error> for FilterError {
    fn from(e: io::Error) -> Self {
        FilterError::Io(e)
    }
}

/// Invalid rule or filter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A rule was given an explicitly empty extension list
    EmptyExtensions {
        /// Root of the offending rule
        root: String,
    },
    /// An extension is missing its leading dot (`html` instead of `.html`)
    InvalidExtension {
        /// The extension as written
        ext: String,
    },
    /// A rule root does not start with `/`
    InvalidRoot {
        /// The root as written
        root: String,
    },
    /// The document root does not exist or is not a directory
    MissingSiteRoot {
        /// The configured document root
        path: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyExtensions { root } => {
                write!(f, "rule '{root}' has an empty extension list")
            }
            ConfigError::InvalidExtension { ext } => {
                write!(
                    f,
                    "invalid extension '{ext}': extensions must start with '.' (e.g. .html)"
                )
            }
            ConfigError::InvalidRoot { root } => {
                write!(f, "invalid rule path '{root}': paths must start with '/'")
            }
            ConfigError::MissingSiteRoot { path } => {
                write!(f, "document root '{path}' is not a directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
