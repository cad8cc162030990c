//! Scopecrawl main entry point
//!
//! This is the command-line interface for the Scopecrawl scoped crawler.

use clap::Parser;
use scopecrawl::config::{load_config_with_hash, validate, Config};
use scopecrawl::crawler::Coordinator;
use scopecrawl::output::print_summary;
use scopecrawl::url::{normalize_url, ScopeRule, SubdomainPolicy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scopecrawl: a scoped, budgeted web crawler
///
/// Scopecrawl follows links from a seed URL without leaving the seed's host
/// and path, stops after a fixed number of pages, and writes the readable
/// text of every page to its own file.
#[derive(Parser, Debug)]
#[command(name = "scopecrawl")]
#[command(version)]
#[command(about = "A scoped, budgeted web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "seed")]
    config: Option<PathBuf>,

    /// Seed URL (overrides the configuration file)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Maximum number of pages to fetch
    #[arg(long, value_name = "N")]
    budget: Option<usize>,

    /// Maximum number of links enqueued per page
    #[arg(long = "fan-out", value_name = "N")]
    fan_out: Option<usize>,

    /// Number of concurrent fetches
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Directory receiving the page text files
    #[arg(long, value_name = "DIR")]
    output: Option<String>,

    /// Also follow links on subdomains of the seed host
    #[arg(long)]
    subdomains: bool,

    /// Stop the session after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,

    /// Render pages in headless Chromium instead of plain HTTP
    #[cfg(feature = "render")]
    #[arg(long)]
    render: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match load_session_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(&cli, config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scopecrawl=info,warn"),
            1 => EnvFilter::new("scopecrawl=debug,info"),
            2 => EnvFilter::new("scopecrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the session configuration: file (if any), then flag overrides
fn load_session_config(cli: &Cli) -> Result<(Config, Option<String>), Box<dyn std::error::Error>> {
    let (mut config, hash) = match (&cli.config, &cli.seed) {
        (Some(path), _) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        (None, Some(seed)) => (Config::for_seed(seed.as_str()), None),
        (None, None) => return Err("either CONFIG or --seed is required".into()),
    };

    if let Some(seed) = &cli.seed {
        config.scope.seed_url = seed.clone();
    }
    if let Some(budget) = cli.budget {
        config.crawler.page_budget = budget;
    }
    if let Some(fan_out) = cli.fan_out {
        config.crawler.fan_out_limit = Some(fan_out);
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(output) = &cli.output {
        config.output.output_root = output.clone();
    }
    if cli.subdomains {
        config.scope.subdomain_policy = SubdomainPolicy::SuffixMatch;
    }
    if let Some(deadline) = cli.deadline {
        config.crawler.deadline_secs = Some(deadline);
    }

    validate(&config)?;
    Ok((config, hash))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let seed = normalize_url(&config.scope.seed_url)?;
    let scope = ScopeRule::from_seed(
        &seed,
        config.scope.subdomain_policy,
        config.scope.path_prefix.as_deref(),
    )?;

    println!("=== Scopecrawl Dry Run ===\n");

    println!("Session:");
    println!("  Seed: {}", seed);
    println!("  Scope: {}", scope);
    println!("  Page budget: {}", config.crawler.page_budget);
    match config.crawler.fan_out_limit {
        Some(limit) => println!("  Fan-out limit: {} per page", limit),
        None => println!("  Fan-out limit: none (breadth-first)"),
    }
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    if let Some(deadline) = config.crawler.deadline_secs {
        println!("  Deadline: {}s", deadline);
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Pages: {}", config.output.output_root);
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Seed page would be written to {}/{}.txt",
        config.output.output_root,
        scope.logical_path(&seed)
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    cli: &Cli,
    config: Config,
    config_hash: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "render")]
    let mut coordinator = if cli.render {
        Coordinator::with_rendering(&config).await?
    } else {
        Coordinator::from_config(&config)?
    };
    #[cfg(not(feature = "render"))]
    let mut coordinator = Coordinator::from_config(&config)?;

    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            cancel.cancel();
        }
    });

    // Run the crawler
    match coordinator.run().await {
        Ok(report) => {
            if !cli.quiet {
                println!();
                print_summary(&report.summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
