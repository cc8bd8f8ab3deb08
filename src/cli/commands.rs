use crate::config::FilterConfig;
use crate::filter::TemplateFilter;
use crate::hot_reload::watch_templates;
use crate::logging::{init_logging, LogConfig};
use crate::rule::RuleSet;
use crate::runtime_config::RuntimeConfig;
use crate::server::{FilterService, Handler, HttpServer};
use crate::static_files::StaticFiles;
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Command-line interface for renderware
#[derive(Parser)]
#[command(name = "renderware")]
#[command(about = "Serve a directory, rendering matched files as templates", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the rules come from, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SiteArgs {
    /// Document root (overrides `site_root` from the config file)
    #[arg(short, long, required_unless_present = "config")]
    pub root: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rule directive `"<path> [ext...]"`, e.g. `"/photos .html"`. Repeatable;
    /// appended after the rules of the config file
    #[arg(long = "rule")]
    pub rules: Vec<String>,
}

impl SiteArgs {
    /// Merge the config file, `--root` and `--rule` into one configuration.
    pub fn load(&self) -> anyhow::Result<FilterConfig> {
        let mut config = match &self.config {
            Some(path) => FilterConfig::load(path)?,
            None => match &self.root {
                Some(root) => FilterConfig::new(root.clone()),
                None => bail!("either --root or --config is required"),
            },
        };
        if let Some(root) = &self.root {
            config.site_root = root.clone();
        }
        config
            .push_directives(&self.rules)
            .context("invalid --rule directive")?;
        Ok(config)
    }

    fn rule_set(&self) -> anyhow::Result<(FilterConfig, RuleSet)> {
        let config = self.load()?;
        let rules = config.rule_set()?;
        Ok((config, rules))
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the document root, rendering templates for matched requests
    Serve {
        #[command(flatten)]
        site: SiteArgs,

        /// Address and port to bind the server to
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,

        /// Reload templates when files below the document root change
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Parse every template reachable through the rules and report errors
    Check {
        #[command(flatten)]
        site: SiteArgs,
    },
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the server fails to
/// start, or `check` finds broken templates.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { site, addr, watch } => serve(&site, &addr, watch),
        Commands::Check { site } => check(&site),
    }
}

fn serve(site: &SiteArgs, addr: &str, watch: bool) -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    let runtime = RuntimeConfig::from_env();
    may::config().set_stack_size(runtime.stack_size);

    let (config, rules) = site.rule_set()?;
    info!(
        site_root = %config.site_root.display(),
        rules = rules.len(),
        stack_size = runtime.stack_size,
        "Starting renderware"
    );
    for rule in &rules {
        debug!(root = %rule.root(), extensions = ?rule.extensions(), "Rule loaded");
    }

    // Keep the watcher alive for as long as the server runs.
    let _watcher = if watch {
        let views = rules.iter().map(|rule| rule.view().clone()).collect();
        Some(
            watch_templates(&config.site_root, views, |_| {})
                .context("failed to watch the document root")?,
        )
    } else {
        None
    };

    let files = StaticFiles::new(config.site_root.clone()).with_index_files(rules.index_files());
    let filter = TemplateFilter::new(Arc::new(files), config.site_root.clone(), rules)
        .with_pool(Arc::new(runtime.buffer_pool()));
    let chain: Arc<dyn Handler> = Arc::new(filter);

    let handle = HttpServer(FilterService::new(chain))
        .start(addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server stopped unexpectedly: {e:?}"))?;
    Ok(())
}

fn check(site: &SiteArgs) -> anyhow::Result<()> {
    let (_, rules) = site.rule_set()?;
    let mut checked = 0usize;
    let mut failures = 0usize;
    for rule in &rules {
        let names = rule
            .view()
            .template_names(rule.extensions())
            .with_context(|| format!("failed to list {}", rule.view().dir().display()))?;
        for name in names {
            checked += 1;
            if let Err(err) = rule.view().check(&name) {
                failures += 1;
                error!(rule = %rule.root(), template = %name, error = %err, "Template check failed");
                eprintln!("{}: {err}", rule.root());
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {checked} templates failed to load");
    }
    println!("{checked} templates OK");
    Ok(())
}
