use crate::config::Config;
use crate::errors::{ForecastError, Result};
use crate::models::series::{DateRange, RawBar, RawClose};
use crate::providers::base::MarketDataProvider;
use crate::services::retry::RetryPolicy;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::sync::Arc;

enum Query<'a> {
    Range { start: NaiveDate, end: NaiveDate },
    Period { period: &'a str, interval: &'a str },
}

/// 行情获取器：瞬时错误按策略重试，空结果立即失败
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider + Send + Sync>,
    policy: RetryPolicy,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider + Send + Sync>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn from_config(provider: Arc<dyn MarketDataProvider + Send + Sync>, config: &Config) -> Self {
        Self::new(provider, RetryPolicy::fixed(config.retry_attempts, config.retry_delay))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `range` 区间内的收盘价，其余字段在此丢弃
    pub async fn fetch(&self, symbol: &str, range: &DateRange) -> Result<Vec<RawClose>> {
        let query = Query::Range { start: range.start(), end: range.end() };
        let bars = self.fetch_with_retry(symbol, &query).await?;

        let closes: Vec<RawClose> = bars
            .into_iter()
            .filter(|bar| bar.close.is_finite())
            .map(|bar| RawClose { timestamp: bar.timestamp, close: bar.close })
            .collect();

        if closes.is_empty() {
            warn!("No closing prices for {} between {} and {}", symbol, range.start(), range.end());
            return Err(ForecastError::DataUnavailable { symbol: symbol.to_string() });
        }

        info!("Fetched {} closing prices for {}", closes.len(), symbol);
        Ok(closes)
    }

    /// 最近一个交易日的收盘价
    pub async fn latest_close(&self, symbol: &str) -> Result<f64> {
        let query = Query::Period { period: "1d", interval: "1d" };
        let bars = self.fetch_with_retry(symbol, &query).await?;

        bars.iter()
            .rev()
            .map(|bar| bar.close)
            .find(|close| close.is_finite())
            .ok_or_else(|| ForecastError::DataUnavailable { symbol: symbol.to_string() })
    }

    async fn request(&self, symbol: &str, query: &Query<'_>) -> Result<Vec<RawBar>> {
        match *query {
            Query::Range { start, end } => self.provider.fetch_range(symbol, start, end).await,
            Query::Period { period, interval } => self.provider.fetch_period(symbol, period, interval).await,
        }
    }

    async fn fetch_with_retry(&self, symbol: &str, query: &Query<'_>) -> Result<Vec<RawBar>> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Requesting {} from {} (attempt {}/{})",
                   symbol, self.provider.name(), attempt, self.policy.max_attempts);

            match self.request(symbol, query).await {
                Ok(bars) if bars.is_empty() => {
                    // 空结果说明代码或区间无效，不重试
                    warn!("{} returned no data for {}", self.provider.name(), symbol);
                    return Err(ForecastError::DataUnavailable { symbol: symbol.to_string() });
                }
                Ok(bars) => return Ok(bars),
                Err(e) if attempt >= self.policy.max_attempts => {
                    error!("Failed to fetch data for {} after {} attempts: {}", symbol, attempt, e);
                    return Err(ForecastError::DataUnavailable { symbol: symbol.to_string() });
                }
                Err(e) => {
                    let delay = self.policy.delay_for_retry(attempt - 1);
                    warn!("Retry {}: failed to fetch data for {}: {} (waiting {:?})", attempt, symbol, e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
