pub mod retry;
pub mod fetcher;
pub mod normalizer;
pub mod forecast;
pub mod stats;
pub mod batch;
