// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod providers;
pub mod services;
pub mod util;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use errors::{ErrorKind, ForecastError, Result};
pub use models::outcome::{BatchResult, FailureReason, PipelineStage, SymbolOutcome};
pub use models::request::BatchRequest;
pub use models::series::{DateRange, Forecast, ForecastPoint, PriceObservation, PriceSeries, SummaryStats};
pub use providers::base::MarketDataProvider;
pub use providers::yahoo::YahooProvider;
pub use services::batch::BatchOrchestrator;
pub use services::fetcher::MarketDataFetcher;
pub use services::forecast::{AdditiveModel, ForecastEngine, ForecastModel};
pub use services::retry::{Backoff, RetryPolicy};
