use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use crate::service::ParkingService;
use crate::settings::Settings;

/// Parking-slot occupancy collector and analyzer.
#[derive(Debug, Parser)]
#[command(name = "parkwatch", version, about)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, env = "PARKWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the settings file)
    #[arg(long, env = "PARKWATCH_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drop the stored readings and reload the full feed history
    Init,
    /// Poll the feed until interrupted with Ctrl-C
    Collect {
        /// Seconds between polls
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
        /// Rows requested per poll
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Daily utilization, peak hour per day and trend
    Analyze {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Dynamic-pricing / reservation suggestions
    Recommend {
        #[arg(long, default_value_t = 14)]
        days: u32,
        /// Utilization fraction above which an hour counts as busy
        #[arg(long)]
        high: Option<f64>,
        /// Utilization fraction below which an hour counts as quiet
        #[arg(long)]
        low: Option<f64>,
    },
    /// Utilization by weekday and by hour of day
    History {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Latest reading per slot
    Status,
}

const NO_DATA: &str = "No data yet – run the collector first.";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render report")?;
    println!("{rendered}");
    Ok(())
}

pub async fn execute(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        settings.database_path = db;
    }
    if let Command::Collect {
        limit: Some(limit), ..
    } = &cli.command
    {
        settings.poll_limit = *limit;
    }

    let service = ParkingService::open(settings)?;

    match cli.command {
        Command::Init => {
            let inserted = service.reset_and_reload().await?;
            println!("Initial historical data saved ({inserted} records).");
        }
        Command::Collect { interval, .. } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| service.settings().collect_interval());
            service.start_collector(interval).await;
            println!(
                "[collector] polling feed every {}s … Ctrl-C to stop",
                interval.as_secs()
            );

            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("Ctrl-C received, stopping collector");

            service.stop_collector().await?;
            print_json(&service.collector_metrics().await)?;
        }
        Command::Analyze { days } => {
            let report = service.get_daily_utilization(days).await?;
            if report.has_data() {
                print_json(&report)?;
            } else {
                println!("{NO_DATA}");
            }
        }
        Command::Recommend { days, high, low } => {
            let defaults = service.settings().recommendation_config();
            let high = high.unwrap_or(defaults.high_threshold);
            let low = low.unwrap_or(defaults.low_threshold);
            for tip in service.get_recommendations(days, high, low).await? {
                println!("‣ {tip}");
            }
        }
        Command::History { days } => {
            let breakdown = service.get_weekday_hour_breakdown(days).await?;
            if breakdown.is_empty() {
                println!("{NO_DATA}");
            } else {
                print_json(&breakdown)?;
            }
        }
        Command::Status => {
            print_json(&service.get_status().await?)?;
        }
    }

    Ok(())
}
