use egostrategy_forecast::{BatchOrchestrator, BatchRequest, Config, SymbolOutcome, YahooProvider};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 创建编排器（并发处理各标的）
    let config = Config::new().with_concurrent(true);
    let provider = Arc::new(YahooProvider::new(&config)?);
    let orchestrator = BatchOrchestrator::new(config, provider);

    let request = BatchRequest::new("AAPL, ZZZZINVALID", "2023-01-01", "2023-03-01").with_forecast_days(30);
    let result = orchestrator.run(&request).await?;

    for outcome in &result.outcomes {
        match outcome {
            SymbolOutcome::Success { symbol, series, forecast, stats } => {
                println!("{}: {} history points, {} forecast points", symbol, series.len(), forecast.len());
                println!("  mean {:.2} median {:.2} max {:.2} min {:.2} std {:.2}",
                         stats.mean, stats.median, stats.max, stats.min, stats.std_dev);
            }
            SymbolOutcome::Failure { symbol, reason } => {
                println!("{}: {}", symbol, reason);
            }
        }
    }

    // 最新收盘价
    let price = orchestrator.latest_price("AAPL").await?;
    println!("AAPL latest close: {:.2}", price);

    Ok(())
}
