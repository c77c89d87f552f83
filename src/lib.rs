pub mod analytics;
pub mod cli;
pub mod collector;
pub mod db;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod recommend;
pub mod service;
pub mod settings;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;

pub use db::{Database, Reading, CAPACITY, SLOT_COUNT};
pub use error::{FetchError, IngestError, ValidationError};
pub use feed::{FeedClient, RawReading};
pub use service::{DailyReport, ParkingService};
pub use settings::Settings;

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(cli::execute(cli))
}
