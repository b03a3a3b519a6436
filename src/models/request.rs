use serde::{Deserialize, Serialize};

use crate::errors::{ForecastError, Result};
use crate::models::series::DateRange;
use crate::util;

/// 预测请求（来自表单或命令行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// 逗号分隔的标的，例如 "AAPL, GOOG, MSFT"
    pub symbols: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub forecast_days: Option<i64>,
}

impl BatchRequest {
    pub fn new(symbols: &str, start_date: &str, end_date: &str) -> Self {
        Self {
            symbols: symbols.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            forecast_days: None,
        }
    }

    pub fn with_forecast_days(mut self, days: i64) -> Self {
        self.forecast_days = Some(days);
        self
    }

    pub fn symbol_list(&self, max_symbols: usize) -> Vec<String> {
        util::split_symbols(&self.symbols, max_symbols)
    }

    pub fn date_range(&self) -> Result<DateRange> {
        util::parse_date_range(&self.start_date, &self.end_date)
    }

    pub fn horizon(&self, default_days: i64) -> Result<usize> {
        validate_horizon(self.forecast_days.unwrap_or(default_days))
    }
}

pub fn validate_horizon(days: i64) -> Result<usize> {
    if days < 1 {
        return Err(ForecastError::InvalidHorizon(days));
    }
    usize::try_from(days).map_err(|_| ForecastError::InvalidHorizon(days))
}
