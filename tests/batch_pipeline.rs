use async_trait::async_trait;
use chrono::{Days, FixedOffset, NaiveDate, TimeZone};
use egostrategy_forecast::models::series::RawBar;
use egostrategy_forecast::{
    BatchOrchestrator, BatchRequest, Config, ErrorKind, ForecastEngine, ForecastError,
    MarketDataFetcher, MarketDataProvider, PipelineStage, Result, RetryPolicy, SymbolOutcome,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 模拟行情对单个标的的响应方式
#[derive(Clone, Copy)]
enum Behaviour {
    /// 请求区间内每个自然日一条数据
    Daily,
    /// 每次调用都返回传输错误
    Down,
    /// 前 `n` 次调用出错，之后返回每日数据
    Flaky(u32),
    /// 无数据也无错误
    Empty,
}

struct FakeMarket {
    behaviour: HashMap<String, Behaviour>,
    calls: Mutex<HashMap<String, u32>>,
}

impl FakeMarket {
    fn new(entries: &[(&str, Behaviour)]) -> Arc<Self> {
        Arc::new(Self {
            behaviour: entries.iter().map(|(s, b)| (s.to_string(), *b)).collect(),
            calls: Mutex::new(HashMap::new()),
        })
    }

    fn calls(&self, symbol: &str) -> u32 {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    fn daily_bars(start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let mut bars = Vec::new();
        let mut date = start;
        let mut i = 0.0f64;
        // 结束日期不包含在内
        while date < end {
            let close = 150.0 + i * 0.5 + (i * 0.9).sin();
            bars.push(RawBar {
                timestamp: new_york.from_local_datetime(&date.and_hms_opt(9, 30, 0).unwrap()).unwrap(),
                open: close - 1.0,
                high: close + 1.0,
                low: close - 2.0,
                close,
                volume: 1_000_000,
            });
            date = date + Days::new(1);
            i += 1.0;
        }
        bars
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(symbol.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.behaviour.get(symbol).copied().unwrap_or(Behaviour::Empty) {
            Behaviour::Daily => Ok(Self::daily_bars(start, end)),
            Behaviour::Down => Err(ForecastError::ProviderError("connection timed out".into())),
            Behaviour::Flaky(n) if call <= n => Err(ForecastError::ProviderError("connection reset".into())),
            Behaviour::Flaky(_) => Ok(Self::daily_bars(start, end)),
            Behaviour::Empty => Ok(Vec::new()),
        }
    }

    async fn fetch_period(&self, symbol: &str, _period: &str, _interval: &str) -> Result<Vec<RawBar>> {
        let day = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        self.fetch_range(symbol, day, day + Days::new(1)).await
    }
}

fn orchestrator(market: Arc<FakeMarket>, config: Config) -> BatchOrchestrator {
    let fetcher = MarketDataFetcher::new(market, RetryPolicy::fixed(3, Duration::from_secs(2)));
    BatchOrchestrator::with_parts(config, fetcher, ForecastEngine::default())
}

fn request(symbols: &str) -> BatchRequest {
    BatchRequest::new(symbols, "2023-01-01", "2023-03-01").with_forecast_days(30)
}

#[tokio::test(start_paused = true)]
async fn end_to_end_success_and_invalid_symbol() {
    let market = FakeMarket::new(&[("AAPL", Behaviour::Daily)]);

    let result = orchestrator(market.clone(), Config::new())
        .run(&request("AAPL, ZZZZINVALID"))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    match &result.outcomes[0] {
        SymbolOutcome::Success { symbol, series, forecast, stats } => {
            assert_eq!(symbol, "AAPL");
            assert_eq!(series.len(), 59);
            assert_eq!(forecast.len(), 59 + 30);
            let history: Vec<NaiveDate> = series.observations.iter().map(|o| o.timestamp).collect();
            let fitted: Vec<NaiveDate> = forecast.points.iter().take(59).map(|p| p.timestamp).collect();
            assert_eq!(history, fitted);
            assert!(stats.min <= stats.mean && stats.mean <= stats.max);
            assert!(stats.min <= stats.median && stats.median <= stats.max);
        }
        other => panic!("expected AAPL to succeed, got {:?}", other),
    }
    match &result.outcomes[1] {
        SymbolOutcome::Failure { symbol, reason } => {
            assert_eq!(symbol, "ZZZZINVALID");
            assert_eq!(reason.kind, ErrorKind::DataUnavailable);
            assert_eq!(reason.stage, PipelineStage::Fetching);
        }
        other => panic!("expected ZZZZINVALID to fail, got {:?}", other),
    }
    // 空结果不重试
    assert_eq!(market.calls("ZZZZINVALID"), 1);
}

#[tokio::test(start_paused = true)]
async fn one_failing_symbol_does_not_affect_the_others() {
    let market = FakeMarket::new(&[
        ("A", Behaviour::Daily),
        ("B", Behaviour::Down),
        ("C", Behaviour::Daily),
    ]);

    let result = orchestrator(market.clone(), Config::new()).run(&request("A,B,C")).await.unwrap();

    assert_eq!(result.symbols(), vec!["A", "B", "C"]);
    assert!(result.outcomes[0].is_success());
    assert!(!result.outcomes[1].is_success());
    assert!(result.outcomes[2].is_success());
    assert_eq!(market.calls("B"), 3);
    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.failed(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_absorbed_by_retry() {
    let market = FakeMarket::new(&[("FLAKY", Behaviour::Flaky(2))]);

    let result = orchestrator(market.clone(), Config::new()).run(&request("FLAKY")).await.unwrap();

    assert!(result.outcomes[0].is_success());
    assert_eq!(market.calls("FLAKY"), 3);
}

#[tokio::test(start_paused = true)]
async fn only_first_four_symbols_are_processed() {
    let market = FakeMarket::new(&[
        ("S1", Behaviour::Daily),
        ("S2", Behaviour::Daily),
        ("S3", Behaviour::Daily),
        ("S4", Behaviour::Daily),
        ("S5", Behaviour::Daily),
        ("S6", Behaviour::Daily),
    ]);

    let result = orchestrator(market.clone(), Config::new())
        .run(&request("S1, S2, S3, S4, S5, S6"))
        .await
        .unwrap();

    assert_eq!(result.symbols(), vec!["S1", "S2", "S3", "S4"]);
    assert_eq!(market.calls("S5"), 0);
    assert_eq!(market.calls("S6"), 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_dates_reject_the_whole_batch() {
    let market = FakeMarket::new(&[("AAPL", Behaviour::Daily)]);
    let bad = BatchRequest::new("AAPL", "2023-01-01", "not-a-date");

    let err = orchestrator(market.clone(), Config::new()).run(&bad).await.unwrap_err();

    assert!(matches!(err, ForecastError::InvalidDateFormat(_)));
    assert_eq!(market.calls("AAPL"), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_mode_preserves_request_order() {
    let entries = [
        ("SLOW", Behaviour::Flaky(2)),
        ("DOWN", Behaviour::Down),
        ("FAST", Behaviour::Daily),
        ("NONE", Behaviour::Empty),
    ];
    let sequential = orchestrator(FakeMarket::new(&entries), Config::new())
        .run(&request("SLOW, DOWN, FAST, NONE"))
        .await
        .unwrap();
    let concurrent = orchestrator(FakeMarket::new(&entries), Config::new().with_concurrent(true))
        .run(&request("SLOW, DOWN, FAST, NONE"))
        .await
        .unwrap();

    assert_eq!(concurrent.symbols(), vec!["SLOW", "DOWN", "FAST", "NONE"]);
    assert_eq!(sequential, concurrent);
}

#[tokio::test(start_paused = true)]
async fn concurrent_retries_do_not_block_siblings() {
    let market = FakeMarket::new(&[("DOWN", Behaviour::Down), ("UP", Behaviour::Daily)]);
    let started = tokio::time::Instant::now();

    let result = orchestrator(market, Config::new().with_concurrent(true))
        .run(&request("DOWN, UP"))
        .await
        .unwrap();

    // 两次等待各 2 秒，并发时总耗时不叠加
    assert_eq!(started.elapsed(), Duration::from_secs(4));
    assert!(result.outcomes[1].is_success());
}

#[tokio::test(start_paused = true)]
async fn latest_price_reports_last_close() {
    let market = FakeMarket::new(&[("AAPL", Behaviour::Daily), ("GONE", Behaviour::Empty)]);
    let orchestrator = orchestrator(market, Config::new());

    let price = orchestrator.latest_price("AAPL").await.unwrap();
    assert!((price - (150.0 + 0.0f64.sin())).abs() < 1e-9);

    let err = orchestrator.latest_price("GONE").await.unwrap_err();
    assert!(matches!(err, ForecastError::DataUnavailable { .. }));
}

#[tokio::test(start_paused = true)]
async fn batch_result_serializes_for_the_presentation_layer() {
    let market = FakeMarket::new(&[("AAPL", Behaviour::Daily)]);

    let result = orchestrator(market, Config::new()).run(&request("AAPL, NOPE")).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["outcomes"][0]["status"], "success");
    assert_eq!(json["outcomes"][0]["forecast"]["points"].as_array().unwrap().len(), 89);
    assert_eq!(json["outcomes"][0]["series"]["observations"][0]["timestamp"], "2023-01-01");
    assert_eq!(json["outcomes"][1]["status"], "failure");
    assert_eq!(json["outcomes"][1]["reason"]["kind"], "data_unavailable");
}
