use crate::errors::{ForecastError, Result};
use crate::models::series::{PriceObservation, PriceSeries, RawClose};
use log::debug;

/// 去掉时区信息，只保留交易所当地的日历日期
pub fn normalize_series(symbol: &str, raw: &[RawClose]) -> Result<PriceSeries> {
    if raw.is_empty() {
        return Err(ForecastError::EmptySeries);
    }

    let observations: Vec<PriceObservation> = raw
        .iter()
        .map(|r| PriceObservation {
            timestamp: r.timestamp.date_naive(),
            close: r.close,
        })
        .collect();

    debug!("Normalized {} observations for {} ({:?} .. {:?})",
           observations.len(), symbol,
           observations.first().map(|o| o.timestamp),
           observations.last().map(|o| o.timestamp));

    Ok(PriceSeries {
        symbol: symbol.to_string(),
        observations,
    })
}
