//! Site-Audit main entry point
//!
//! This is the command-line interface for the Site-Audit crawler.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use site_audit::config::{load_config_with_hash, validate, Config, CrawlOptions, CrawlOptionsInput};
use site_audit::crawler::{crawl_site, generate_sitemap};
use site_audit::output::generate_markdown_report;
use site_audit::url::{is_valid_url, with_default_scheme};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Audit: a bounded site crawler and SEO issue aggregator
///
/// Site-Audit walks one website breadth-first while respecting robots.txt,
/// scores every page and reports prioritized issues or an XML sitemap.
#[derive(Parser, Debug)]
#[command(name = "site-audit")]
#[command(version)]
#[command(about = "A bounded site crawler and SEO issue aggregator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and print the analysis result as JSON
    Analyze {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Also write a markdown issue report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Crawl a site and print an XML sitemap with crawl statistics as JSON
    Sitemap {
        #[command(flatten)]
        crawl: CrawlArgs,
    },
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Base URL of the site; `https://` is assumed when no scheme is given
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON file with crawl options (camelCase keys)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Maximum link depth from the base URL (clamped to 1..=5)
    #[arg(long)]
    max_depth: Option<i64>,

    /// Maximum number of URLs to fetch
    #[arg(long)]
    max_urls: Option<i64>,

    /// Skip URLs containing this substring (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Only follow links whose path starts with this prefix (repeatable)
    #[arg(long = "include-path", value_name = "PREFIX")]
    include_path: Vec<String>,

    /// Follow links to other hosts
    #[arg(long)]
    external: bool,

    /// Do not fetch or honor robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<u32>,

    /// Write the JSON output to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl CrawlArgs {
    /// Crawl options given as flags; unset flags leave the value open
    fn flag_options(&self) -> CrawlOptionsInput {
        CrawlOptionsInput {
            max_depth: self.max_depth,
            max_urls: self.max_urls,
            include_external_links: self.external.then_some(true),
            follow_robots_txt: self.ignore_robots.then_some(false),
            exclude_url_patterns: (!self.exclude.is_empty()).then(|| self.exclude.clone()),
            inclusion_paths: (!self.include_path.is_empty()).then(|| self.include_path.clone()),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Analyze { crawl, report } => handle_analyze(crawl, report).await,
        Command::Sitemap { crawl } => handle_sitemap(crawl).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the JSON result.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_audit=info,warn"),
            1 => EnvFilter::new("site_audit=debug,info"),
            2 => EnvFilter::new("site_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads configuration and resolves the base URL and crawl input
///
/// Option precedence, lowest first: config `[defaults]`, `--options` file, flags.
fn prepare(args: &CrawlArgs) -> Result<(Config, String, CrawlOptionsInput)> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(workers) = args.workers {
        config.crawler.workers = workers;
        validate(&config).context("Invalid --workers value")?;
    }

    let base_url = with_default_scheme(&args.url);
    if !is_valid_url(&base_url) {
        bail!("Invalid URL: {}", args.url);
    }

    let mut input = config.defaults.clone();
    if let Some(path) = &args.options {
        input = input.merge(read_options_file(path)?);
    }
    input = input.merge(args.flag_options());

    Ok((config, base_url, input))
}

fn read_options_file(path: &Path) -> Result<CrawlOptionsInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    CrawlOptionsInput::from_json(&content)
        .with_context(|| format!("Failed to parse options file {}", path.display()))
}

/// Handles `analyze`: crawls, prints the result and optionally writes the report
async fn handle_analyze(args: CrawlArgs, report: Option<PathBuf>) -> Result<()> {
    let (config, base_url, input) = prepare(&args)?;
    let options = CrawlOptions::for_analysis(input);

    let result = crawl_site(&base_url, options, &config)
        .await
        .with_context(|| format!("Crawl of {} failed", base_url))?;

    tracing::info!(
        "Average score {} across {} pages, {} issues",
        result.summary.avg_score,
        result.summary.total_pages,
        result.summary.issues.len()
    );

    if let Some(path) = report {
        generate_markdown_report(&result, &path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, args.output.as_deref())
}

/// Handles `sitemap`: crawls with sitemap defaults and prints the sitemap
async fn handle_sitemap(args: CrawlArgs) -> Result<()> {
    let (config, base_url, input) = prepare(&args)?;
    let options = CrawlOptions::for_sitemap(input);

    let output = generate_sitemap(&base_url, options, &config)
        .await
        .with_context(|| format!("Sitemap crawl of {} failed", base_url))?;

    tracing::info!(
        "Sitemap built from {} pages ({} errors)",
        output.stats.total_urls,
        output.stats.errors
    );

    let json = serde_json::to_string_pretty(&output)?;
    write_output(&json, args.output.as_deref())
}

fn write_output(json: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write output {}", path.display()))?;
            tracing::info!("Output written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
