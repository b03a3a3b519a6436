use crate::config::Config;
use crate::errors::{ForecastError, Result};
use crate::models::series::RawBar;
use crate::providers::base::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API 响应
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance 数据源
pub struct YahooProvider {
    client: Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl YahooProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ForecastError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            min_interval: config.min_request_interval,
            last_request: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let should_wait = {
            let mut last = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let should_wait = (*last)
                .map(|instant| self.min_interval.saturating_sub(instant.elapsed()))
                .filter(|wait| !wait.is_zero());
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("Waiting {:?} before next Yahoo request", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// 标的作为单独的路径段编码，`/`、`?` 等字符不会改变路径
    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ForecastError::ProviderError(format!("invalid base url {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| ForecastError::ProviderError(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    async fn get_chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<Vec<RawBar>> {
        self.wait_for_rate_limit().await;

        let response = self.client
            .get(self.chart_url(symbol)?)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Yahoo responded {} for {}", status, symbol);

        // 404 也会带 JSON 错误体，先尝试解析
        match serde_json::from_str::<ChartResponse>(&text) {
            Ok(chart) => {
                if !status.is_success() && !is_not_found(&chart) {
                    return Err(ForecastError::ProviderError(format!(
                        "Yahoo returned HTTP status {} for {}", status, symbol
                    )));
                }
                parse_chart(symbol, chart)
            }
            Err(e) if status.is_success() => Err(ForecastError::JsonError(e)),
            Err(_) => Err(ForecastError::ProviderError(format!(
                "Yahoo returned HTTP status {} for {}", status, symbol
            ))),
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>> {
        info!("Fetching {} history from {} to {}", symbol, start, end);

        // 结束日期不包含在内
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let period2 = end.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let (period1, period2) = match (period1, period2) {
            (Some(p1), Some(p2)) => (p1, p2),
            _ => return Err(ForecastError::Internal(format!("invalid range {} - {}", start, end))),
        };

        self.get_chart(symbol, &[
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ]).await
    }

    async fn fetch_period(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<RawBar>> {
        info!("Fetching {} for period {} at interval {}", symbol, period, interval);

        self.get_chart(symbol, &[
            ("range", period.to_string()),
            ("interval", interval.to_string()),
        ]).await
    }
}

fn is_not_found(chart: &ChartResponse) -> bool {
    chart.chart.error.as_ref().is_some_and(|e| e.code == "Not Found")
}

/// 解析 chart 响应；无数据时返回空列表（交由调用方判定）
fn parse_chart(symbol: &str, chart: ChartResponse) -> Result<Vec<RawBar>> {
    let body = chart.chart;

    if let Some(err) = body.error {
        if err.code == "Not Found" {
            debug!("Yahoo has no data for {}: {}", symbol, err.description);
            return Ok(Vec::new());
        }
        return Err(ForecastError::ProviderError(format!("{}: {}", err.code, err.description)));
    }

    let data = match body.result.and_then(|r| r.into_iter().next()) {
        Some(data) => data,
        None => return Ok(Vec::new()),
    };

    let timestamps = match data.timestamp {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let zone = ExchangeZone::from_meta(&data.meta);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let timestamp = zone.localize(ts).ok_or_else(|| {
            ForecastError::ProviderError(format!("invalid timestamp {} for {}", ts, symbol))
        })?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        // 停牌或节假日整行为空
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
            continue;
        }

        bars.push(RawBar {
            timestamp,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: volume.unwrap_or(0),
        });
    }

    debug!("Parsed {} bars for {}", bars.len(), symbol);
    Ok(bars)
}

/// 交易所所在时区
enum ExchangeZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl ExchangeZone {
    fn from_meta(meta: &ChartMeta) -> Self {
        if let Some(tz) = meta.exchange_timezone_name.as_deref().and_then(|name| name.parse::<Tz>().ok()) {
            return ExchangeZone::Named(tz);
        }
        let offset = meta.gmtoffset
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        ExchangeZone::Fixed(offset)
    }

    fn localize(&self, ts: i64) -> Option<DateTime<FixedOffset>> {
        let utc = DateTime::from_timestamp(ts, 0)?;
        Some(match self {
            ExchangeZone::Named(tz) => tz.from_utc_datetime(&utc.naive_utc()).fixed_offset(),
            ExchangeZone::Fixed(offset) => offset.from_utc_datetime(&utc.naive_utc()),
        })
    }
}
