use egostrategy_forecast::config::{Config, DEFAULT_FORECAST_DAYS};
use egostrategy_forecast::models::outcome::{BatchResult, SymbolOutcome};
use egostrategy_forecast::models::request::BatchRequest;
use egostrategy_forecast::providers::yahoo::YahooProvider;
use egostrategy_forecast::services::batch::BatchOrchestrator;

use anyhow::Context;
use clap::{App, Arg, SubCommand};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let default_days = DEFAULT_FORECAST_DAYS.to_string();

    let app = App::new("Forecast")
        .version("1.0.0")
        .author("Forecast Team")
        .about("Stock price forecasting with per-symbol failure isolation")
        .arg(
            Arg::with_name("retries")
                .long("retries")
                .value_name("ATTEMPTS")
                .help("Maximum fetch attempts per symbol")
                .takes_value(true)
                .default_value("3"),
        )
        .arg(
            Arg::with_name("retry-delay")
                .long("retry-delay")
                .value_name("SECONDS")
                .help("Seconds to wait between fetch attempts")
                .takes_value(true)
                .default_value("2"),
        )
        .arg(
            Arg::with_name("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Market data endpoint (Yahoo Finance compatible)")
                .takes_value(true),
        );

    let app = app.subcommand(
        SubCommand::with_name("predict")
            .about("Forecast closing prices for up to four symbols")
            .arg(
                Arg::with_name("symbols")
                    .short('s')
                    .long("symbols")
                    .value_name("SYMBOLS")
                    .help("Comma separated symbols, e.g. \"AAPL, GOOG, MSFT\" (max 4)")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("start")
                    .long("start")
                    .value_name("DATE")
                    .help("History start date (YYYY-MM-DD)")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("end")
                    .long("end")
                    .value_name("DATE")
                    .help("History end date (YYYY-MM-DD, exclusive)")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("days")
                    .short('d')
                    .long("days")
                    .value_name("DAYS")
                    .help("Number of calendar days to forecast")
                    .takes_value(true)
                    .allow_hyphen_values(true)
                    .default_value(&default_days),
            )
            .arg(
                Arg::with_name("concurrent")
                    .short('c')
                    .long("concurrent")
                    .help("Process symbols concurrently")
                    .takes_value(false),
            )
            .arg(
                Arg::with_name("json")
                    .long("json")
                    .help("Print the full batch result as JSON")
                    .takes_value(false),
            ),
    ).subcommand(
        SubCommand::with_name("latest")
            .about("Show the latest closing price of a symbol")
            .arg(
                Arg::with_name("symbol")
                    .short('s')
                    .long("symbol")
                    .value_name("SYMBOL")
                    .help("Symbol to look up")
                    .required(true)
                    .takes_value(true),
            ),
    );

    let matches = app.get_matches();

    let retries = matches.value_of("retries")
        .unwrap_or("3")
        .parse::<u32>()
        .context("--retries must be a non-negative integer")?;
    let retry_delay = matches.value_of("retry-delay")
        .unwrap_or("2")
        .parse::<u64>()
        .context("--retry-delay must be a whole number of seconds")?;

    let mut config = Config::new()
        .with_retry_attempts(retries)
        .with_retry_delay(Duration::from_secs(retry_delay));
    if let Some(url) = matches.value_of("base-url") {
        config = config.with_base_url(url);
    }

    if let Some(matches) = matches.subcommand_matches("predict") {
        let days = matches.value_of("days")
            .unwrap_or(&default_days)
            .parse::<i64>()
            .context("--days must be an integer")?;

        let request = BatchRequest::new(
            matches.value_of("symbols").unwrap_or_default(),
            matches.value_of("start").unwrap_or_default(),
            matches.value_of("end").unwrap_or_default(),
        ).with_forecast_days(days);

        let config = config.with_concurrent(matches.is_present("concurrent"));
        let provider = Arc::new(YahooProvider::new(&config)?);
        let orchestrator = BatchOrchestrator::new(config, provider);

        let result = match orchestrator.run(&request).await {
            Ok(result) => result,
            Err(e) => {
                error!("Request rejected: {}", e);
                return Err(e.into());
            }
        };

        if matches.is_present("json") {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }
    } else if let Some(matches) = matches.subcommand_matches("latest") {
        let symbol = matches.value_of("symbol").unwrap_or_default();
        let provider = Arc::new(YahooProvider::new(&config)?);
        let orchestrator = BatchOrchestrator::new(config, provider);

        let price = orchestrator.latest_price(symbol).await
            .with_context(|| format!("Could not get the latest price of {}", symbol))?;
        println!("{} latest close: {:.2}", symbol.trim(), price);
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}

fn print_result(result: &BatchResult) {
    for outcome in &result.outcomes {
        match outcome {
            SymbolOutcome::Success { symbol, series, forecast, stats } => {
                println!("{} forecast", symbol);
                println!("{:-<60}", "");
                println!("{:<12} {:<12} {:<12} {:<12}", "Date", "Predicted", "Lower", "Upper");
                println!("{:-<60}", "");
                for point in forecast.future_points() {
                    println!("{:<12} {:<12.2} {:<12.2} {:<12.2}",
                             point.timestamp, point.predicted_value, point.lower_bound, point.upper_bound);
                }
                println!("{:-<60}", "");
                println!("history: {} observations, last close {:.2}",
                         series.len(),
                         series.observations.last().map(|o| o.close).unwrap_or(f64::NAN));
                println!("mean {:.2}  median {:.2}  max {:.2}  min {:.2}  std {:.2}",
                         stats.mean, stats.median, stats.max, stats.min, stats.std_dev);
                println!();
            }
            SymbolOutcome::Failure { symbol, reason } => {
                println!("{} error: {}", symbol, reason);
                println!();
            }
        }
    }
}
