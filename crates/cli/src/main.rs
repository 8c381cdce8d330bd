use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use coinfolio_core::config::EngineConfig;
use coinfolio_core::logging::init_logging;
use coinfolio_core::CoinTracker;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current USD prices and 1h/24h/7d changes
    Prices {
        /// Coin ids, e.g. bitcoin ethereum
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Convert an amount between fiat currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    /// Value every wallet of a user from a saved data file
    Overview {
        /// Snapshot file with users, wallets and alerts
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        user: Uuid,
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    /// Evaluate price alerts on a schedule until Ctrl-C, then save the data file
    Watch {
        #[arg(long)]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(command) => run(command, cli.config.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

async fn run(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        Commands::Prices { ids } => {
            let tracker = CoinTracker::new(config)?;
            let prices = tracker.coin_prices(&ids).await?;
            for id in missing_prices(&ids, &prices) {
                tracing::warn!(coin_id = %id, "No price available");
            }
            print_json(&prices)
        }
        Commands::Convert { amount, from, to } => {
            let tracker = CoinTracker::new(config)?;
            let converted = tracker.convert(amount, &from, &to).await?;
            println!("{amount} {} = {converted:.4} {}", from.to_uppercase(), to.to_uppercase());
            Ok(())
        }
        Commands::Overview {
            data,
            user,
            currency,
        } => {
            let tracker = load_tracker(config, &data)?;
            let overview = tracker.portfolio_overview(user, &currency).await?;
            print_json(&overview)
        }
        Commands::Watch { data } => {
            let tracker = load_tracker(config, &data)?;
            let interval = tracker.config().alert_interval();
            tracing::info!(interval_secs = interval.as_secs(), "Watching price alerts");

            let handle = tracker.alert_scheduler().spawn(interval);
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            handle.shutdown().await;

            tracker
                .save_to_file(&data)
                .with_context(|| format!("Failed to save {}", data.display()))?;
            tracing::info!(path = %data.display(), "Saved data");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn load_tracker(config: EngineConfig, data: &Path) -> Result<CoinTracker> {
    CoinTracker::load_from_file(config, data)
        .with_context(|| format!("Failed to load data from {}", data.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Requested ids with no entry in `prices`, which is keyed by normalized id.
fn missing_prices<'a, V>(ids: &'a [String], prices: &HashMap<String, V>) -> Vec<&'a str> {
    ids.iter()
        .map(String::as_str)
        .filter(|id| !prices.contains_key(&id.trim().to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_and_mixed_case_ids_are_not_missing() {
        let prices = HashMap::from([("bitcoin".to_string(), 1.0), ("ethereum".to_string(), 2.0)]);
        let ids = vec![
            " Bitcoin ".to_string(),
            "ETHEREUM".to_string(),
            "ghost".to_string(),
        ];
        assert_eq!(missing_prices(&ids, &prices), vec!["ghost"]);
    }
}
