use crate::config::Config;
use crate::errors::{ForecastError, Result};
use crate::models::outcome::{BatchResult, FailureReason, PipelineStage, SymbolOutcome};
use crate::models::request::BatchRequest;
use crate::models::series::{DateRange, Forecast, PriceSeries, SummaryStats};
use crate::providers::base::MarketDataProvider;
use crate::services::fetcher::MarketDataFetcher;
use crate::services::forecast::ForecastEngine;
use crate::services::{normalizer, stats};
use log::{debug, info, warn};
use std::sync::Arc;

/// 批量预测：逐个标的执行流水线，单个失败不影响其他标的
pub struct BatchOrchestrator {
    config: Config,
    fetcher: Arc<MarketDataFetcher>,
    engine: Arc<ForecastEngine>,
}

impl BatchOrchestrator {
    /// 使用默认预测模型和配置中的重试策略
    pub fn new(config: Config, provider: Arc<dyn MarketDataProvider + Send + Sync>) -> Self {
        let fetcher = MarketDataFetcher::from_config(provider, &config);
        Self::with_parts(config, fetcher, ForecastEngine::default())
    }

    pub fn with_parts(config: Config, fetcher: MarketDataFetcher, engine: ForecastEngine) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            engine: Arc::new(engine),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 先校验整批输入，再逐个处理标的
    ///
    /// 日期和预测天数出错时整批失败，不会请求任何标的；之后的错误按标的记录
    pub async fn run(&self, request: &BatchRequest) -> Result<BatchResult> {
        let range = request.date_range()?;
        let horizon = request.horizon(self.config.default_forecast_days)?;
        let symbols = request.symbol_list(self.config.max_symbols);

        info!("Forecasting {} symbol(s) from {} to {} with horizon {}",
              symbols.len(), range.start(), range.end(), horizon);

        Ok(self.run_with(&symbols, &range, horizon).await)
    }

    /// 已校验输入的入口，结果顺序与 `symbols` 一致
    pub async fn run_with(&self, symbols: &[String], range: &DateRange, horizon: usize) -> BatchResult {
        let symbols = &symbols[..symbols.len().min(self.config.max_symbols)];

        let outcomes = if self.config.concurrent {
            self.run_concurrent(symbols, *range, horizon).await
        } else {
            let mut outcomes = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                outcomes.push(process_symbol(&self.fetcher, &self.engine, symbol, *range, horizon).await);
            }
            outcomes
        };

        let result = BatchResult { outcomes };
        info!("Batch finished: {} succeeded, {} failed", result.succeeded(), result.failed());
        result
    }

    /// 单个标的的最新收盘价
    pub async fn latest_price(&self, symbol: &str) -> Result<f64> {
        self.fetcher.latest_close(symbol.trim()).await
    }

    async fn run_concurrent(&self, symbols: &[String], range: DateRange, horizon: usize) -> Vec<SymbolOutcome> {
        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let fetcher = Arc::clone(&self.fetcher);
                let engine = Arc::clone(&self.engine);
                let symbol = symbol.clone();
                tokio::spawn(async move { process_symbol(&fetcher, &engine, &symbol, range, horizon).await })
            })
            .collect();

        // 按请求顺序收集，与完成顺序无关
        let mut outcomes = Vec::with_capacity(handles.len());
        for (symbol, handle) in symbols.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = ForecastError::Internal(format!("task for {} did not complete: {}", symbol, e));
                    warn!("{}", err);
                    SymbolOutcome::Failure {
                        symbol: symbol.clone(),
                        reason: FailureReason::from_error(PipelineStage::Failed, &err),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

async fn process_symbol(
    fetcher: &MarketDataFetcher,
    engine: &ForecastEngine,
    symbol: &str,
    range: DateRange,
    horizon: usize,
) -> SymbolOutcome {
    let mut stage = PipelineStage::Pending;

    match run_pipeline(fetcher, engine, symbol, &range, horizon, &mut stage).await {
        Ok((series, forecast, stats)) => {
            info!("{}: {} observations, {} forecast points, mean {:.2}",
                  symbol, series.len(), forecast.len(), stats.mean);
            SymbolOutcome::Success {
                symbol: symbol.to_string(),
                series,
                forecast,
                stats,
            }
        }
        Err(e) => {
            warn!("{} failed while {}: {}", symbol, stage, e);
            SymbolOutcome::Failure {
                symbol: symbol.to_string(),
                reason: FailureReason::from_error(stage, &e),
            }
        }
    }
}

async fn run_pipeline(
    fetcher: &MarketDataFetcher,
    engine: &ForecastEngine,
    symbol: &str,
    range: &DateRange,
    horizon: usize,
    stage: &mut PipelineStage,
) -> Result<(PriceSeries, Forecast, SummaryStats)> {
    *stage = PipelineStage::Fetching;
    let raw = fetcher.fetch(symbol, range).await?;

    *stage = PipelineStage::NormalizingSeries;
    let series = normalizer::normalize_series(symbol, &raw)?;

    *stage = PipelineStage::Forecasting;
    let forecast = engine.forecast(&series, horizon)?;

    *stage = PipelineStage::Summarizing;
    let stats = stats::summarize(&forecast)?;

    *stage = PipelineStage::Succeeded;
    debug!("{} reached {}", symbol, stage);
    Ok((series, forecast, stats))
}
