use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid forecast horizon: {0} (must be a positive integer)")]
    InvalidHorizon(i64),

    #[error("No data available for {symbol}")]
    DataUnavailable { symbol: String },

    #[error("Price series is empty")]
    EmptySeries,

    #[error("Forecast is empty")]
    EmptyForecast,

    #[error("Model fit failed: {0}")]
    ModelFitFailure(String),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// 错误类别，用于对外输出（不携带底层错误对象）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidDateFormat,
    InvalidDateRange,
    InvalidHorizon,
    DataUnavailable,
    EmptySeries,
    EmptyForecast,
    ModelFitFailure,
    Transport,
    Internal,
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::InvalidDateFormat(_) => ErrorKind::InvalidDateFormat,
            ForecastError::InvalidDateRange { .. } => ErrorKind::InvalidDateRange,
            ForecastError::InvalidHorizon(_) => ErrorKind::InvalidHorizon,
            ForecastError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            ForecastError::EmptySeries => ErrorKind::EmptySeries,
            ForecastError::EmptyForecast => ErrorKind::EmptyForecast,
            ForecastError::ModelFitFailure(_) => ErrorKind::ModelFitFailure,
            ForecastError::RequestError(_)
            | ForecastError::JsonError(_)
            | ForecastError::ProviderError(_) => ErrorKind::Transport,
            ForecastError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 日期和预测天数属于整批请求的输入，出错时整批失败
    pub fn is_batch_wide(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidDateFormat | ErrorKind::InvalidDateRange | ErrorKind::InvalidHorizon
        )
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;

// 用于从字符串创建错误
impl From<String> for ForecastError {
    fn from(s: String) -> Self {
        ForecastError::Internal(s)
    }
}

impl From<&str> for ForecastError {
    fn from(s: &str) -> Self {
        ForecastError::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_wide_errors_are_date_and_horizon_only() {
        assert!(ForecastError::InvalidDateFormat("x".into()).is_batch_wide());
        assert!(ForecastError::InvalidHorizon(0).is_batch_wide());
        assert!(!ForecastError::EmptySeries.is_batch_wide());
        assert!(!ForecastError::DataUnavailable { symbol: "AAPL".into() }.is_batch_wide());
    }

    #[test]
    fn provider_failures_map_to_transport_kind() {
        assert_eq!(ForecastError::ProviderError("timeout".into()).kind(), ErrorKind::Transport);
        assert_eq!(ForecastError::from("boom").kind(), ErrorKind::Internal);
    }
}
