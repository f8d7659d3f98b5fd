//! accesskey: command-line entry point for the access-key ledger.

mod scenario;

use std::path::{Path, PathBuf};

use accesskey_fees::usd_fee_to_rate;
use accesskey_ledger::LedgerConfig;
use accesskey_utils::{format_duration, format_units, parse_units, LogFormat};
use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use crate::scenario::{Replay, Scenario};

const DECIMALS: u32 = 18;

#[derive(Parser)]
#[command(name = "accesskey", about = "Collateralized access-key ledger tools")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(long, env = "ACCESSKEY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ACCESSKEY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ACCESSKEY_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,
    /// Convert a monthly USD fee into a per-second rate at a given price.
    Quote {
        /// Monthly fee in USD, e.g. "100" or "9.99".
        #[arg(long)]
        monthly_usd: String,
        /// Collateral price in USD scaled by 10 000 (2500 = $0.25).
        #[arg(long)]
        price: u128,
    },
    /// Replay a scenario file and print one JSON line per step.
    Run {
        scenario: PathBuf,
        /// Pretty-print each outcome.
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Serialize)]
struct Quote {
    monthly_fee_usd: String,
    price: u128,
    seconds_per_month: u64,
    fee_per_second: u128,
    per_day: String,
    per_month: String,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LedgerConfig> {
    match path {
        Some(path) => LedgerConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(LedgerConfig::default()),
    }
}

fn quote(config: &LedgerConfig, monthly_usd: &str, price: u128) -> anyhow::Result<Quote> {
    let fee = parse_units(monthly_usd, DECIMALS)?;
    let seconds_per_month = config.params.seconds_per_month;
    let rate = usd_fee_to_rate(&config.price_asset, fee, price, seconds_per_month)?;
    Ok(Quote {
        monthly_fee_usd: format_units(fee, DECIMALS),
        price,
        seconds_per_month,
        fee_per_second: rate,
        per_day: format_units(rate.saturating_mul(86_400), DECIMALS),
        per_month: format_units(rate.saturating_mul(u128::from(seconds_per_month)), DECIMALS),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    let format: LogFormat = config.log_format.parse()?;
    accesskey_utils::init_logging(format, &config.log_level);
    config.validate()?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string());
        }
        Command::Quote { monthly_usd, price } => {
            let quote = quote(&config, &monthly_usd, price)?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Command::Run { scenario, pretty } => {
            let text = std::fs::read_to_string(&scenario)
                .with_context(|| format!("reading scenario {}", scenario.display()))?;
            let parsed: Scenario =
                toml::from_str(&text).with_context(|| format!("parsing scenario {}", scenario.display()))?;
            tracing::info!(steps = parsed.steps.len(), "replaying {}", scenario.display());

            let mut replay = Replay::new(config, &parsed)?;
            let outcomes = replay.run(&parsed.steps);
            for outcome in &outcomes {
                let line = if pretty {
                    serde_json::to_string_pretty(outcome)?
                } else {
                    serde_json::to_string(outcome)?
                };
                println!("{line}");
            }

            let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
            let simulated = format_duration(replay.now().saturating_sub(parsed.start));
            tracing::info!(failed, %simulated, "replay finished");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use accesskey_fees::FeeError;

    #[test]
    fn quote_converts_at_the_given_price() {
        let quote = quote(&LedgerConfig::default(), "100", 2_500).unwrap();
        assert_eq!(quote.monthly_fee_usd, "100");
        assert_eq!(
            quote.fee_per_second,
            100 * 10u128.pow(DECIMALS) * 10_000 / 2_500 / u128::from(quote.seconds_per_month)
        );
    }

    #[test]
    fn zero_price_quote_reports_the_price() {
        let config = LedgerConfig::default();
        let err = quote(&config, "100", 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FeeError>(),
            Some(&FeeError::ZeroPrice(config.price_asset.clone()))
        );
    }
}
