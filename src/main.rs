mod browser;
mod catalog;
mod dom;
mod export;
mod parser;
mod schedule;
mod store;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use catalog::CatalogEntry;
use dom::{CatalogPageMap, SeriesPageMap};

const CATALOG_URL_ENV: &str = "COINSCRAPE_CATALOG_URL";

// Run cadence: every 4 hours, so the weekly cycle is 42 slots.
const RUNS_PER_DAY: u32 = 6;
const RUN_PERIOD_HOURS: u32 = 4;

#[derive(Parser)]
#[command(name = "coinscrape", about = "Coin price guide scraper")]
struct Cli {
    /// Directory holding the catalog blob and CSV exports
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the series catalog from the source site and save it
    Populate {
        /// Catalog page URL (defaults to COINSCRAPE_CATALOG_URL)
        #[arg(long)]
        url: Option<String>,
        /// Page load timeout, seconds
        #[arg(long, default_value = "60")]
        page_timeout: u64,
    },
    /// Read prices for this slot's catalog slice and export CSVs
    Run {
        /// Read a single series by name, bypassing the scheduler
        #[arg(long, requires = "url")]
        series: Option<String>,
        /// Price page URL for --series
        #[arg(long, requires = "series")]
        url: Option<String>,
        /// Pause between series, milliseconds
        #[arg(long, default_value = "2000")]
        delay_ms: u64,
        /// Page load timeout, seconds
        #[arg(long, default_value = "60")]
        page_timeout: u64,
    },
    /// Show the catalog slice the scheduler assigns to the current slot
    Slice,
    /// List the persisted catalog
    Catalog {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Populate { url, page_timeout } => {
            populate(&cli.data_dir, url, page_timeout).await
        }
        Commands::Run {
            series,
            url,
            delay_ms,
            page_timeout,
        } => run(&cli.data_dir, series.zip(url), delay_ms, page_timeout).await,
        Commands::Slice => show_slice(&cli.data_dir),
        Commands::Catalog { limit } => show_catalog(&cli.data_dir, limit),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn catalog_url(cli_url: Option<String>) -> Result<String> {
    match cli_url.or_else(|| std::env::var(CATALOG_URL_ENV).ok()) {
        Some(url) => Ok(url),
        None => bail!("no catalog URL: pass --url or set {CATALOG_URL_ENV}"),
    }
}

async fn populate(data_dir: &Path, url: Option<String>, page_timeout: u64) -> Result<()> {
    let url = catalog_url(url)?;
    let session = browser::Session::launch(Duration::from_secs(page_timeout)).await?;
    let outcome = regenerate_catalog(&session, &url, data_dir).await;
    session.close().await;

    let entries = outcome?;
    println!("Catalog populated: {} series", entries.len());
    Ok(())
}

async fn regenerate_catalog(
    session: &browser::Session,
    url: &str,
    data_dir: &Path,
) -> Result<Vec<CatalogEntry>> {
    info!(url, "reading series catalog");
    session.goto(url).await?;
    let entries = catalog::extract_catalog(session, &CatalogPageMap::default()).await;
    if entries.is_empty() {
        warn!("catalog read produced no entries");
    }
    store::save_catalog(data_dir, &entries)?;
    Ok(entries)
}

async fn run(
    data_dir: &Path,
    single: Option<(String, String)>,
    delay_ms: u64,
    page_timeout: u64,
) -> Result<()> {
    let session = browser::Session::launch(Duration::from_secs(page_timeout)).await?;
    let outcome = run_slice(&session, data_dir, single, delay_ms).await;
    session.close().await;
    outcome
}

async fn run_slice(
    session: &browser::Session,
    data_dir: &Path,
    single: Option<(String, String)>,
    delay_ms: u64,
) -> Result<()> {
    let now = Utc::now();

    let work: Vec<CatalogEntry> = match single {
        Some((series, url)) => vec![CatalogEntry { series, url }],
        None => {
            let entries = match store::load_catalog(data_dir)? {
                Some(entries) => entries,
                None => {
                    info!("no catalog blob found, populating first");
                    let url = catalog_url(None)?;
                    regenerate_catalog(session, &url, data_dir).await?
                }
            };
            let slice =
                schedule::current_slice(entries.len(), now, RUNS_PER_DAY, RUN_PERIOD_HOURS);
            info!(
                total = entries.len(),
                start = slice.start,
                end = slice.end,
                "catalog slice for this slot"
            );
            entries[slice].to_vec()
        }
    };

    if work.is_empty() {
        info!("nothing scheduled for this slot");
        return Ok(());
    }

    let pb = ProgressBar::new(work.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut results = Vec::new();
    for (i, entry) in work.iter().enumerate() {
        pb.set_message(entry.series.clone());
        let series = read_series(session, entry).await;
        if !series.issues.is_empty() {
            results.push(series);
        }
        pb.inc(1);

        // Pace requests so the source site sees one series at a time.
        if i + 1 < work.len() {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
    pb.finish_and_clear();

    let week = schedule::week_start_key(now);
    let written = export::save_exports(data_dir, &week, &results)?;
    println!(
        "Exported {} of {} series to exports/{}",
        written.len(),
        work.len(),
        week
    );
    Ok(())
}

/// Read one series, best-effort: a page that fails to load yields an empty
/// series and the run moves on.
async fn read_series(session: &browser::Session, entry: &CatalogEntry) -> parser::CoinSeries {
    if let Err(e) = session.goto(&entry.url).await {
        error!(series = %entry.series, error = %e, "failed to load series page");
        return parser::CoinSeries {
            name: entry.series.clone(),
            issues: Vec::new(),
        };
    }
    parser::extract_series(session, &SeriesPageMap::default(), &entry.series).await
}

fn show_slice(data_dir: &Path) -> Result<()> {
    let Some(entries) = store::load_catalog(data_dir)? else {
        println!("No catalog blob. Run 'populate' first.");
        return Ok(());
    };

    let now = Utc::now();
    let slice = schedule::current_slice(entries.len(), now, RUNS_PER_DAY, RUN_PERIOD_HOURS);
    println!(
        "Week {} | slot range {}..{} of {} series",
        schedule::week_start_key(now),
        slice.start,
        slice.end,
        entries.len()
    );
    for entry in &entries[slice] {
        println!("  {} | {}", entry.series, entry.url);
    }
    Ok(())
}

fn show_catalog(data_dir: &Path, limit: usize) -> Result<()> {
    let Some(entries) = store::load_catalog(data_dir)? else {
        println!("No catalog blob. Run 'populate' first.");
        return Ok(());
    };

    println!("{:>4} | {:<32} | URL", "#", "Series");
    println!("{}", "-".repeat(90));
    for (i, entry) in entries.iter().take(limit).enumerate() {
        println!("{:>4} | {:<32} | {}", i + 1, truncate(&entry.series, 32), entry.url);
    }
    println!("\n{} of {} series", entries.len().min(limit), entries.len());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
