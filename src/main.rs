//! Backscroll main entry point
//!
//! This is the command-line interface for retrieving historical posts from a
//! cursor-paginated search listing.

use anyhow::{bail, Context};
use backscroll::config::{load_config_with_hash, load_credentials, Config};
use backscroll::crawler::{HtmlPageParser, HttpPageFetcher};
use backscroll::hydrate::HttpLookupClient;
use backscroll::pipeline::{CrawlPipeline, CrawlStream, PipelineSettings};
use backscroll::search::{SearchOptions, SearchSpec};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Backscroll: historical post retrieval
///
/// Backscroll walks a newest-first search listing page by page, optionally
/// one day at a time so the oldest posts come first, and prints every
/// discovered post as one JSON object per line.
#[derive(Parser, Debug)]
#[command(name = "backscroll")]
#[command(version = "1.0.0")]
#[command(about = "Historical post retrieval over a paginated search listing", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// All of these words (comma separated)
    #[arg(long)]
    allwords: Option<String>,

    /// Any of these words (comma separated)
    #[arg(long)]
    anywords: Option<String>,

    /// This exact phrase
    #[arg(long)]
    exactphrase: Option<String>,

    /// None of these words (comma separated)
    #[arg(long)]
    nonewords: Option<String>,

    /// These hashtags (whitespace separated)
    #[arg(long)]
    hashtags: Option<String>,

    /// Written in this language (e.g. en)
    #[arg(long)]
    lang: Option<String>,

    /// From these accounts (whitespace separated)
    #[arg(long)]
    fromusers: Option<String>,

    /// To these accounts (whitespace separated)
    #[arg(long)]
    tousers: Option<String>,

    /// Mentioning these accounts (whitespace separated)
    #[arg(long)]
    mentionusers: Option<String>,

    /// Near this place
    #[arg(long)]
    place: Option<String>,

    /// Only positive posts
    #[arg(long)]
    positive: bool,

    /// Only negative posts
    #[arg(long)]
    negative: bool,

    /// Include reposts
    #[arg(long)]
    retweets: bool,

    /// Lower bound: YYYY-MM-DD, optionally followed by HH:MM[:SS] (UTC)
    #[arg(long)]
    since: Option<String>,

    /// Upper bound: YYYY-MM-DD, optionally followed by HH:MM[:SS] (UTC)
    #[arg(long)]
    until: Option<String>,

    /// Search one day at a time, oldest day first
    #[arg(long)]
    daily: bool,

    /// Emit each walk in ascending creation order
    #[arg(long)]
    chronological: bool,

    /// Hydrate every post through the look-up endpoint and print the full objects
    #[arg(long)]
    raw: bool,

    /// Credentials profile used with --raw
    #[arg(long)]
    profile: Option<String>,

    /// Credentials file used with --raw
    #[arg(long, value_name = "PATH")]
    credentials: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the resolved request and date ranges without fetching anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn search_options(&self) -> SearchOptions {
        SearchOptions {
            allwords: self.allwords.clone(),
            anywords: self.anywords.clone(),
            exactphrase: self.exactphrase.clone(),
            nonewords: self.nonewords.clone(),
            hashtags: self.hashtags.clone(),
            lang: self.lang.clone(),
            fromusers: self.fromusers.clone(),
            tousers: self.tousers.clone(),
            mentionusers: self.mentionusers.clone(),
            place: self.place.clone(),
            positive: self.positive,
            negative: self.negative,
            retweets: self.retweets,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let stored = &config.search;
    let options = stored.options.clone().merge(cli.search_options());
    if options.is_empty() {
        bail!("No search terms given, on the command line or in the [search] table");
    }

    let spec = SearchSpec::parse(
        options,
        cli.since.as_deref().or(stored.since.as_deref()),
        cli.until.as_deref().or(stored.until.as_deref()),
        cli.daily || stored.daily,
        cli.chronological || stored.chronological,
    )?;

    if cli.dry_run {
        return handle_dry_run(&spec, &config);
    }

    handle_crawl(&cli, spec, &config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("backscroll=info,warn"),
            1 => EnvFilter::new("backscroll=debug,info"),
            2 => EnvFilter::new("backscroll=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be requested
fn handle_dry_run(spec: &SearchSpec, config: &Config) -> anyhow::Result<()> {
    println!("=== Backscroll Dry Run ===\n");

    println!("Request parameters:");
    for (key, value) in spec.request(None).params() {
        println!("  {} = {}", key, value);
    }

    let cutoffs = spec.cutoffs();
    if !cutoffs.is_unbounded() {
        println!("\nExact cutoffs:");
        if let Some(since) = cutoffs.strictly_since {
            println!("  since {}", since);
        }
        if let Some(until) = cutoffs.strictly_until {
            println!("  until {}", until);
        }
    }

    if spec.daily {
        let ranges = spec.date_ranges()?;
        println!("\nDaily ranges ({}):", ranges.len());
        for range in ranges {
            println!("  - {}", range);
        }
    }

    println!("\nEndpoints:");
    println!("  Search: {}", config.fetcher.search_url);
    println!("  Timeline: {}", config.fetcher.timeline_url);
    println!("  Look-up: {}", config.lookup.endpoint);

    println!("\n✓ Search is valid");
    Ok(())
}

/// Handles the normal mode: runs the pipeline and prints records
async fn handle_crawl(cli: &Cli, spec: SearchSpec, config: &Config) -> anyhow::Result<()> {
    let fetcher = HttpPageFetcher::new(&config.fetcher)?;
    let pipeline = CrawlPipeline::new(
        spec,
        Arc::new(fetcher),
        Arc::new(HtmlPageParser::new()),
        PipelineSettings::from_config(config),
    )?;

    let stop = pipeline.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, draining pipeline");
            stop.stop();
        }
    });

    let written = if cli.raw {
        let profile = cli.profile.as_deref().unwrap_or(&config.lookup.profile);
        let path = cli
            .credentials
            .as_ref()
            .or(config.lookup.credentials_path.as_ref())
            .context("--raw needs a credentials file (--credentials or lookup.credentials-path)")?;
        let credentials = load_credentials(path, profile)
            .with_context(|| format!("Failed to load credentials from {}", path.display()))?;
        let lookup = HttpLookupClient::new(&config.lookup, credentials.bearer_token)?;

        print_records(pipeline.run(Arc::new(lookup)), |record| &record.payload).await?
    } else {
        print_records(pipeline.run_unhydrated(), |record| record).await?
    };

    tracing::info!("Wrote {} records", written);
    Ok(())
}

/// Prints every record of `stream` as one JSON line on stdout
async fn print_records<T, V, F>(mut stream: CrawlStream<T>, view: F) -> anyhow::Result<usize>
where
    T: Send + 'static,
    V: Serialize + ?Sized,
    F: Fn(&T) -> &V,
{
    let stdout = std::io::stdout();

    while let Some(record) = stream.next().await? {
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, view(&record))?;
        writeln!(out)?;
    }

    stdout.lock().flush()?;
    Ok(stream.emitted())
}
