// Copyright 2025 Webmobix Solutions AG
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUTHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod auth;
mod config;
mod layout;
mod market;
mod pipeline;
mod server;
mod sheets;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::{DEFAULT_SHEET_NAME, RunConfig};
use market::{ItemId, MarketClient};
use tracing::info;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_env_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch bazaar prices once and write them into the spreadsheet
    Run {
        /// Google spreadsheet ID to write into
        #[arg(long)]
        spreadsheet_id: String,

        /// Numeric tab ID (gid) within the spreadsheet
        #[arg(long, default_value_t = 0)]
        sheet_id: i32,

        /// Tab name used for value ranges
        #[arg(long, default_value = DEFAULT_SHEET_NAME)]
        sheet_name: String,

        /// Comma-separated item IDs, in column order
        #[arg(long)]
        items: String,

        /// Torn API key (falls back to the TORN_API_KEY environment variable)
        #[arg(long)]
        market_key: Option<String>,

        /// Path to the Google service-account JSON key
        #[arg(long)]
        key_file: PathBuf,

        /// Preview the run without touching the spreadsheet
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the POST /items endpoint
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Path to the Google service-account JSON key
        #[arg(long)]
        key_file: PathBuf,
    },
}

#[derive(Parser)]
#[command(name = "bazaar-price-sync")]
#[command(about = "Cache Torn bazaar item prices into a formatted Google Sheet")]
#[command(version)]
struct Cli {
    /// Controls verbosity of log output (overrides RUST_LOG when provided)
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

fn init_logging(level: &LogLevel) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level.as_env_filter()))?;

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .init();

    Ok(())
}

/// Parses the comma-separated item list, keeping numeric tokens numeric so
/// they match the catalog's keys either way.
fn parse_items(raw: &str) -> Vec<ItemId> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<u64>() {
            Ok(id) => ItemId::Number(id),
            Err(_) => ItemId::Text(token.to_string()),
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize default crypto provider for rustls
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Run {
            spreadsheet_id,
            sheet_id,
            sheet_name,
            items,
            market_key,
            key_file,
            dry_run,
        } => {
            handle_run_command(
                spreadsheet_id,
                sheet_id,
                sheet_name,
                items,
                market_key,
                key_file,
                dry_run,
            )
            .await?;
        }
        Commands::Serve { port, key_file } => {
            handle_serve_command(port, key_file).await?;
        }
    }

    Ok(())
}

async fn handle_run_command(
    spreadsheet_id: String,
    sheet_id: i32,
    sheet_name: String,
    items: String,
    market_key: Option<String>,
    key_file: PathBuf,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        info!("🔍 Running in dry-run mode - the spreadsheet will not be touched");
    }

    let market_api_key = match market_key {
        Some(key) => key,
        None => std::env::var("TORN_API_KEY")
            .context("Provide --market-key or set the TORN_API_KEY environment variable")?,
    };

    let config = RunConfig::new(
        spreadsheet_id,
        sheet_id,
        sheet_name,
        parse_items(&items),
        market_api_key,
        dry_run,
    );
    config.validate()?;

    let hub = auth::sheets_hub(&key_file).await?;
    let market = MarketClient::new()?;

    let summary = pipeline::run(hub, &market, &config).await?;
    info!(
        "✅ Done: {} items, {} cells updated",
        summary.items, summary.updated_cells
    );

    Ok(())
}

async fn handle_serve_command(port: u16, key_file: PathBuf) -> anyhow::Result<()> {
    let hub = auth::sheets_hub(&key_file).await?;
    let market = MarketClient::new()?;

    let state = Arc::new(server::AppState { hub, market });
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("🚀 Server started!\nlocalhost:{}", port);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_items() {
        assert_eq!(
            parse_items("101, 102,abc,"),
            vec![
                ItemId::Number(101),
                ItemId::Number(102),
                ItemId::Text("abc".to_string())
            ]
        );
    }

    #[test]
    fn empty_item_string_parses_to_no_items() {
        assert!(parse_items("").is_empty());
        assert!(parse_items(" , ,").is_empty());
    }
}
