use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};

mod ai;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod services;
#[cfg(test)]
mod testing;

use config::Config;
use db::Repository;
use error::Result;
use pipeline::{Pipeline, Stage};
use services::FetchWindow;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info by default, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config_path = flag_value(&args, "--config").map(PathBuf::from);
    let stage = flag_value(&args, "--stage")
        .map(|name| name.parse::<Stage>())
        .transpose()?;
    let all_historical = args.iter().any(|arg| arg == "--all");

    // Load configuration
    let config = Config::load(config_path.as_deref())?;

    let repository = Repository::new(&config.db_path).await?;
    tracing::info!(
        "Opened {} ({} articles)",
        config.db_path,
        repository.count_records().await?
    );

    let pipeline = Pipeline::from_config(&config, Arc::new(repository))?;

    let window = if all_historical {
        FetchWindow::All
    } else {
        FetchWindow::Since(Utc::now() - Duration::hours(i64::from(config.fetch_lookback_hours)))
    };

    // Run one stage, or the whole pipeline in order
    let reports = match stage {
        Some(stage) => vec![(stage, pipeline.run_stage(stage, window).await)],
        None => pipeline.run(window).await,
    };

    for (stage, report) in reports {
        println!(
            "{:<10} selected {:>4}  written {:>4}  skipped {:>4}  failed {:>4}",
            stage, report.selected, report.written, report.skipped, report.failed
        );
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
