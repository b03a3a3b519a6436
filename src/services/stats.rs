use crate::errors::{ForecastError, Result};
use crate::models::series::{Forecast, SummaryStats};
use statrs::statistics::{Data, Median, Statistics};

/// 对全部预测值（历史 + 未来）计算描述统计
pub fn summarize(forecast: &Forecast) -> Result<SummaryStats> {
    let values = forecast.predicted_values();
    if values.is_empty() {
        return Err(ForecastError::EmptyForecast);
    }

    // 样本标准差 (n - 1)，单点时为 0
    let std_dev = if values.len() > 1 { Statistics::std_dev(&values) } else { 0.0 };

    Ok(SummaryStats {
        mean: Statistics::mean(&values),
        median: Data::new(values.clone()).median(),
        max: Statistics::max(&values),
        min: Statistics::min(&values),
        std_dev,
    })
}
