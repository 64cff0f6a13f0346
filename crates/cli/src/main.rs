//! Command Line Interface for lp-watch.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use lp_watch_data::{CaptureQuery, CaptureRepository, Database, InMemoryCaptureRepository};
use lp_watch_domain::{Capture, PositionRecord, Protocol};
use lp_watch_execution::prelude::*;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lp-watch")]
#[command(about = "Capture and track DeFi liquidity positions", long_about = None)]
struct Cli {
    /// JSON file used as capture store when DATABASE_URL is not set
    #[arg(long, global = true, default_value = "lp-watch-captures.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture saved protocol pages
    Capture {
        /// Page files: JSON fixtures, or HTML with --url
        #[arg(required = true)]
        pages: Vec<String>,

        /// Address of the page when capturing raw HTML
        #[arg(long)]
        url: Option<String>,
    },
    /// List stored captures, newest first
    History {
        /// Only captures of this protocol (e.g. Orca)
        #[arg(short, long)]
        protocol: Option<Protocol>,

        /// Only captures holding this pair (e.g. SOL/USDC)
        #[arg(long)]
        pair: Option<String>,

        /// Maximum number of captures to list
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the latest position per pool with portfolio statistics
    Stats,
    /// Delete old captures
    Prune {
        /// Keep captures from the last N days
        #[arg(short, long)]
        days: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = CaptureConfig::from_env();
    let repository = open_repository(&cli.store, &config).await?;
    let service = CaptureService::new(repository, config);

    match &cli.command {
        Commands::Capture { pages, url } => {
            let mut source = FilePageSource::new();
            if let Some(url) = url {
                source = source.with_address(url);
            }

            let mut documents = Vec::with_capacity(pages.len());
            for location in pages {
                match source.fetch(location).await {
                    Ok(page) => documents.push(page),
                    Err(e) => println!("❌ {}: {}", location, e),
                }
            }

            let session = service.capture_session(&documents).await;
            for outcome in &session.outcomes {
                match outcome {
                    CaptureOutcome::Captured(report) => print_report(report),
                    CaptureOutcome::Unsupported { url } => {
                        println!("⏭️  Unsupported page: {}", url);
                    }
                }
            }
        }
        Commands::History {
            protocol,
            pair,
            limit,
        } => {
            let query = CaptureQuery {
                protocol: *protocol,
                pair: pair.clone(),
                limit: Some(*limit),
            };
            let captures = service.captures(&query).await?;
            print_captures(&captures);
        }
        Commands::Stats => {
            let (latest, stats) = service.portfolio().await?;
            print_positions(&latest);

            println!("\n📊 Portfolio");
            println!("Positions:      {}", stats.total_positions);
            println!(
                "In / out range: {} / {}",
                stats.in_range_count, stats.out_of_range_count
            );
            println!("Total value:    ${:.2}", stats.total_value);
            println!("Pending yield:  ${:.2}", stats.total_pending_yield);
            println!("Average APY:    {}", fmt_percent(stats.avg_apy));
            let protocols: Vec<&str> = stats.protocols.iter().map(|p| p.name()).collect();
            println!("Protocols:      {}", protocols.join(", "));
        }
        Commands::Prune { days } => {
            let days = days.unwrap_or(service.config().retention_days);
            let removed = service.prune(days).await?;
            println!("🧹 Removed {} captures older than {} days", removed, days);
        }
    }

    Ok(())
}

async fn open_repository(
    store: &Path,
    config: &CaptureConfig,
) -> Result<Arc<dyn CaptureRepository>> {
    if let Ok(database_url) = env::var("DATABASE_URL") {
        let database = Database::connect(&database_url)
            .await
            .context("failed to connect to DATABASE_URL")?;
        database.migrate().await.context("failed to run migrations")?;
        return Ok(Arc::new(database.captures()));
    }

    let repository = InMemoryCaptureRepository::open(store, config.max_captures)
        .await
        .with_context(|| format!("failed to open capture store {}", store.display()))?;
    Ok(Arc::new(repository))
}

fn print_report(report: &CaptureReport) {
    let capture = &report.capture;
    println!(
        "\n✅ {} | {} positions | {}",
        capture.protocol, capture.snapshot.position_count, capture.url
    );
    if let Some(failure) = &report.failure {
        println!("⚠️  {}", failure);
    }
    if !report.stored {
        println!("⚠️  Capture could not be stored");
    }

    if capture.has_positions() {
        let records = PositionRecord::from_capture(capture);
        print_positions(&records);
    }

    let validation = &report.validation;
    println!(
        "Validation: {} ({} issues, {} warnings)",
        if validation.passed { "passed" } else { "FAILED" },
        validation.issues.len(),
        validation.warnings.len()
    );
    for issue in &validation.issues {
        println!("  ❌ {}", issue);
    }
    for warning in &validation.warnings {
        println!("  ⚠️  {}", warning);
    }

    match &report.comparison {
        None => println!("Changes: no previous capture to compare"),
        Some(comparison) => {
            println!(
                "Changes since {}:",
                comparison.previous_timestamp.format("%Y-%m-%d %H:%M")
            );
            for pair in &comparison.positions_added {
                println!("  ➕ {}", pair);
            }
            for pair in &comparison.positions_removed {
                println!("  ➖ {}", pair);
            }
            for change in &comparison.critical_changes {
                println!("  🚨 {}", change);
            }
            for change in &comparison.significant_changes {
                println!("  📈 {}", change);
            }
            if comparison.is_quiet() {
                println!("  (none)");
            }
        }
    }
}

fn print_positions(records: &[PositionRecord]) {
    let mut table = Table::new();
    table.add_row(row![
        "Protocol", "Pair", "Balance", "Pending", "APY", "Range", "Price", "Status", "Distance"
    ]);
    for (index, record) in records.iter().enumerate() {
        let p = &record.position;
        let range = match (p.range_min, p.range_max) {
            (Some(min), Some(max)) => format!("{} - {}", min, max),
            _ => "-".to_string(),
        };
        table.add_row(row![
            record.protocol,
            p.label(index),
            fmt_usd(p.balance),
            fmt_usd(p.pending_yield),
            fmt_percent(p.apy),
            range,
            p.current_price.map_or("-".to_string(), |v| v.to_string()),
            p.range_status.map_or("-", |s| s.as_str()),
            p.distance_from_range.as_deref().unwrap_or("-")
        ]);
    }
    table.printstd();
}

fn print_captures(captures: &[Capture]) {
    if captures.is_empty() {
        println!("No captures stored");
        return;
    }
    let mut table = Table::new();
    table.add_row(row![
        "Time", "Protocol", "Positions", "In range", "Out of range", "Total value", "Error"
    ]);
    for capture in captures {
        let snapshot = &capture.snapshot;
        table.add_row(row![
            capture.timestamp.format("%Y-%m-%d %H:%M"),
            capture.protocol,
            snapshot.position_count,
            snapshot.in_range_count,
            snapshot.out_of_range_count,
            fmt_usd(snapshot.summary.total_value),
            capture.extraction_error.as_deref().unwrap_or("")
        ]);
    }
    table.printstd();
}

fn fmt_usd(value: Option<Decimal>) -> String {
    value.map_or("-".to_string(), |v| format!("${:.2}", v))
}

fn fmt_percent(value: Option<Decimal>) -> String {
    value.map_or("-".to_string(), |v| format!("{:.2}%", v))
}
