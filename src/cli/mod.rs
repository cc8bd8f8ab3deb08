//! # CLI Module
//!
//! Command-line front end for serving a site through the template filter.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! renderware serve --root ./site --rule "/photos .html" --addr 127.0.0.1:8080 --watch
//! ```
//!
//! Options:
//! - `--root <DIR>` - Document root (or `site_root` from `--config`)
//! - `--config <FILE>` - YAML configuration file
//! - `--rule <DIRECTIVE>` - Rule as `"<path> [ext...]"`, repeatable
//! - `--addr <ADDR>` - Bind address (default: `0.0.0.0:8080`)
//! - `--watch` - Reload templates on file changes
//!
//! Without any rule the whole site is covered by one default rule
//! (`/` with `.html`, `.htm`, `.jinja`).
//!
//! ### `check`
//!
//! ```bash
//! renderware check --config site.yaml
//! ```
//!
//! Loads every template the rules can reach and exits non-zero if any fails
//! to parse.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands, SiteArgs};
