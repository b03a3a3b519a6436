use crate::models::series::RawBar;
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Pull-style source of historical bars.
///
/// An `Err` is treated as a transient transport failure and may be retried;
/// an empty `Ok` means the symbol or range has no data and is never retried.
#[async_trait]
pub trait MarketDataProvider {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Fetch daily bars for `symbol` between `start` and `end`
    async fn fetch_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>>;

    /// Fetch bars for a relative period such as `"1d"` at the given interval
    async fn fetch_period(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<RawBar>>;
}
