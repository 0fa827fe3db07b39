mod boundary;
mod config;
mod error;
mod models;
mod scrapers;

use crate::boundary::{Rejection, ScrapeRequest};
use crate::config::AppConfig;
use crate::models::{ExtractionResult, ExtractionTarget};
use crate::scrapers::{ChromeProvider, Pipeline};
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Extract description, reviews, amenities and photos from a listing page
#[derive(Debug, Parser)]
#[command(name = "listing-scout", version)]
struct Cli {
    /// Page to extract; `/rooms/<id>` URLs get the full detail extraction
    url: Option<String>,

    /// Authorization header value, `Bearer <SCRAPER_API_KEY>`
    #[arg(long, env = "SCRAPER_AUTHORIZATION", hide_env_values = true)]
    authorization: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Also write the result to a timestamped file in this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("🏠 Listing Scout");

    let outcome = run(&cli, &config).await;
    let (json, code) = match outcome {
        Ok(result) => {
            if let Some(dir) = &cli.save_dir {
                keep(dir, cli.url.as_deref().unwrap_or_default(), &result).await;
            }
            (render(&result, cli.pretty)?, ExitCode::SUCCESS)
        }
        Err(rejection) => {
            error!(status = rejection.status(), "{rejection}");
            (render(&rejection.body(), cli.pretty)?, ExitCode::FAILURE)
        }
    };

    println!("{json}");
    Ok(code)
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<ExtractionResult, Rejection> {
    let request = ScrapeRequest::from_parts(cli.authorization.as_deref(), cli.url.as_deref(), config)?;

    let provider = ChromeProvider::new(
        config.browser.chrome_path.clone(),
        Duration::from_secs(config.browser.idle_timeout_secs),
    );
    let pipeline = Pipeline::new(provider, config)?;
    let result = pipeline.extract(&request.url).await?;

    info!(
        "✅ Extracted {} chars of text, {} reviews, {} amenities, {} photos",
        result.main_text.len(),
        result.reviews.as_ref().map_or(0, Vec::len),
        result.amenities.as_ref().map_or(0, Vec::len),
        result.photos.as_ref().map_or(0, Vec::len),
    );
    Ok(result)
}

fn render<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Save a copy of the result; a failed save never costs the caller the output
async fn keep(dir: &Path, url: &str, result: &ExtractionResult) -> Option<PathBuf> {
    match save(dir, url, result).await {
        Ok(path) => {
            info!("💾 Saved result to {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!("Failed to save result: {e:#}");
            None
        }
    }
}

/// `<dir>/<listing id or host>-<UTC timestamp>.json`
async fn save(dir: &Path, url: &str, result: &ExtractionResult) -> anyhow::Result<PathBuf> {
    let stem = ExtractionTarget::parse(url)
        .ok()
        .and_then(|t| {
            t.listing_id()
                .map(str::to_string)
                .or_else(|| t.url().host_str().map(str::to_string))
        })
        .unwrap_or_else(|| "result".to_string());
    let path = dir.join(format!("{stem}-{}.json", Utc::now().format("%Y%m%dT%H%M%SZ")));

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    tokio::fs::write(&path, serde_json::to_string_pretty(result)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
