use std::time::Duration;

pub const DEFAULT_MAX_SYMBOLS: usize = 4;
pub const DEFAULT_FORECAST_DAYS: i64 = 30;
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub max_symbols: usize,
    pub default_forecast_days: i64,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub min_request_interval: Duration,
    pub base_url: String,
    pub concurrent: bool,  // 每个标的一个任务
}

impl Config {
    pub fn new() -> Self {
        Self {
            max_symbols: DEFAULT_MAX_SYMBOLS,
            default_forecast_days: DEFAULT_FORECAST_DAYS,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            min_request_interval: Duration::from_millis(500),
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            concurrent: false,
        }
    }

    pub fn with_max_symbols(mut self, max: usize) -> Self {
        self.max_symbols = max;
        self
    }

    pub fn with_default_forecast_days(mut self, days: i64) -> Self {
        self.default_forecast_days = days;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
