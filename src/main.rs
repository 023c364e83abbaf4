//! Page-Inspector main entry point
//!
//! This is the command-line interface for the Page-Inspector page analyzer.

use chrono::Utc;
use clap::{ArgGroup, Parser};
use futures::future::join_all;
use page_inspector::config::{load_config_with_hash, Config};
use page_inspector::crawler::Crawler;
use page_inspector::jobs::{JobHandle, JobOutcome, JobRunner, Submission};
use page_inspector::output::{
    format_existing, format_job_report, format_job_table, format_outcome, load_statistics,
    print_statistics, write_job_report,
};
use page_inspector::state::JobStatus;
use page_inspector::storage::{open_storage, JobStore, ListQuery, SortField, SortOrder, SqliteStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Page-Inspector: single-page structure and link-health analyzer
///
/// Page-Inspector fetches a page, reports its markup version, title, heading
/// counts, and login-form presence, classifies its links as internal or
/// external, and probes every link for reachability. Each submitted URL is
/// tracked as a job in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "page-inspector")]
#[command(version)]
#[command(about = "Single-page structure and link-health analyzer", long_about = None)]
#[command(group(
    ArgGroup::new("mode").args(["dry_run", "list", "show", "rerun", "delete", "stats"])
))]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URLs to submit for inspection
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without crawling
    #[arg(long)]
    dry_run: bool,

    /// List stored jobs and exit
    #[arg(long)]
    list: bool,

    /// Only list jobs with this status (queued, running, done, error)
    #[arg(long, value_name = "STATUS")]
    status: Option<JobStatus>,

    /// Listing page number, starting at 1
    #[arg(long, value_name = "N")]
    page: Option<u32>,

    /// Jobs per listing page (default 10, max 100)
    #[arg(long, value_name = "N")]
    limit: Option<u32>,

    /// Listing sort column
    #[arg(long, value_name = "FIELD")]
    sort_by: Option<SortField>,

    /// Listing sort direction (asc or desc)
    #[arg(long, value_name = "ORDER")]
    order: Option<String>,

    /// Show one job, including its broken links, and exit
    #[arg(long, value_name = "ID")]
    show: Option<i64>,

    /// Print JSON instead of text (with --show or --list)
    #[arg(long)]
    json: bool,

    /// Write the --show report to a markdown file instead of stdout
    #[arg(long, value_name = "PATH", requires = "show")]
    output: Option<PathBuf>,

    /// Clear a job's results and crawl it again
    #[arg(long, value_name = "ID")]
    rerun: Option<i64>,

    /// Delete a job and its broken links
    #[arg(long, value_name = "ID")]
    delete: Option<i64>,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.urls);
    } else if cli.list {
        handle_list(&config, &cli)?;
    } else if let Some(job_id) = cli.show {
        handle_show(&config, job_id, cli.json, cli.output.as_deref())?;
    } else if let Some(job_id) = cli.rerun {
        handle_rerun(&config, job_id).await?;
    } else if let Some(job_id) = cli.delete {
        handle_delete(&config, job_id)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_submit(&config, &cli.urls).await?;
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
            0 => EnvFilter::new("page_inspector=info,warn"),
            1 => EnvFilter::new("page_inspector=debug,info"),
            2 => EnvFilter::new("page_inspector=trace,debug"),
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

fn open_store(config: &Config) -> page_inspector::Result<SqliteStore> {
    let store = open_storage(Path::new(&config.output.database_path))?;
    Ok(store)
}

/// Opens the store and builds a runner
///
/// Jobs still `running` whose lease has lapsed belong to a process that
/// died; they go back to `queued`. Jobs another live process is crawling
/// keep renewing their lease and are left alone.
fn build_runner(config: &Config) -> page_inspector::Result<JobRunner<SqliteStore>> {
    let mut store = open_store(config)?;

    let requeued = store.requeue_interrupted(Utc::now())?;
    if requeued > 0 {
        tracing::warn!("Requeued {} job(s) interrupted by an earlier run", requeued);
    }

    let crawler = Crawler::from_config(config)?;
    Ok(JobRunner::new(
        store,
        crawler,
        config.crawler.max_concurrent_crawls,
    ))
}

/// Waits for every handle; Ctrl-C cancels whatever is still outstanding
async fn wait_for_jobs(
    runner: &JobRunner<SqliteStore>,
    handles: Vec<(String, JobHandle)>,
) -> Vec<(i64, String, JobOutcome)> {
    let waiting = join_all(handles.into_iter().map(|(address, handle)| async move {
        let job_id = handle.job_id();
        (job_id, address, handle.wait().await)
    }));
    tokio::pin!(waiting);

    tokio::select! {
        outcomes = &mut waiting => outcomes,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling outstanding jobs");
            runner.shutdown();
            waiting.await
        }
    }
}

/// Handles the --dry-run mode: validates config and shows the effective settings
fn handle_dry_run(config: &Config, urls: &[String]) {
    println!("=== Page-Inspector Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout);
    println!("  Probe timeout: {}s", config.crawler.probe_timeout);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!(
        "  Max concurrent probes: {}",
        config.crawler.max_concurrent_probes
    );
    println!(
        "  Max concurrent crawls: {}",
        config.crawler.max_concurrent_crawls
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nURLs ({}):", urls.len());
    for url in urls {
        match page_inspector::url::parse_target(url) {
            Ok(target) => println!("  - {}", target),
            Err(e) => println!("  - {} (invalid: {})", url, e),
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the default mode: submits every URL and waits for the crawls
async fn handle_submit(config: &Config, urls: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if urls.is_empty() {
        println!("No URLs given; nothing to inspect. See --help for other modes.");
        return Ok(());
    }

    let runner = build_runner(config)?;
    let mut handles = Vec::new();

    for url in urls {
        match runner.submit(url) {
            Ok(Submission::Created(handle)) => handles.push((url.trim().to_string(), handle)),
            Ok(Submission::Existing(job)) => println!("{}", format_existing(&job)),
            Err(e) => {
                tracing::error!("Could not submit {}: {}", url, e);
                println!("{}: rejected: {}", url, e);
            }
        }
    }

    tracing::info!("Waiting for {} job(s)", handles.len());
    for (job_id, address, outcome) in wait_for_jobs(&runner, handles).await {
        println!("{}", format_outcome(job_id, &address, &outcome));
    }

    Ok(())
}

/// Handles the --rerun mode: clears a job and crawls it again
async fn handle_rerun(config: &Config, job_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let runner = build_runner(config)?;
    let handle = runner.rerun(job_id)?;
    let address = runner.with_store(|store| store.get_job(job_id))?.address;

    for (job_id, address, outcome) in wait_for_jobs(&runner, vec![(address, handle)]).await {
        println!("{}", format_outcome(job_id, &address, &outcome));
    }

    Ok(())
}

/// Handles the --list mode: prints one page of jobs
fn handle_list(config: &Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = ListQuery::default();
    let query = ListQuery {
        status: cli.status,
        page: cli.page.unwrap_or(defaults.page),
        limit: cli.limit.unwrap_or(defaults.limit),
        sort_by: cli.sort_by.unwrap_or(defaults.sort_by),
        order: cli
            .order
            .as_deref()
            .map(SortOrder::from_query)
            .unwrap_or(defaults.order),
    };

    let store = open_store(config)?;
    let page = store.list_jobs(&query)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print!("{}", format_job_table(&page));
    }

    Ok(())
}

/// Handles the --show mode: prints one job with its broken links
fn handle_show(
    config: &Config,
    job_id: i64,
    json: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let job = store.get_job(job_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else if let Some(path) = output {
        write_job_report(&job, path)?;
        println!("✓ Report written to: {}", path.display());
    } else {
        print!("{}", format_job_report(&job));
    }

    Ok(())
}

/// Handles the --delete mode
fn handle_delete(config: &Config, job_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(config)?;
    store.delete_job(job_id)?;

    tracing::info!("Deleted job {}", job_id);
    println!("✓ Deleted job {}", job_id);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(config)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}
