use serde::Serialize;
use std::fmt;

use crate::errors::{ErrorKind, ForecastError};
use crate::models::series::{Forecast, PriceSeries, SummaryStats};

/// 单个标的在流水线中所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Pending,
    Fetching,
    NormalizingSeries,
    Forecasting,
    Summarizing,
    Succeeded,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Pending => "pending",
            PipelineStage::Fetching => "fetching",
            PipelineStage::NormalizingSeries => "normalizing-series",
            PipelineStage::Forecasting => "forecasting",
            PipelineStage::Summarizing => "summarizing",
            PipelineStage::Succeeded => "succeeded",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReason {
    pub kind: ErrorKind,
    pub stage: PipelineStage,
    pub message: String,
}

impl FailureReason {
    pub fn from_error(stage: PipelineStage, err: &ForecastError) -> Self {
        Self {
            kind: err.kind(),
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (while {})", self.message, self.stage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Success {
        symbol: String,
        series: PriceSeries,
        forecast: Forecast,
        stats: SummaryStats,
    },
    Failure {
        symbol: String,
        reason: FailureReason,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Success { symbol, .. } | SymbolOutcome::Failure { symbol, .. } => symbol,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SymbolOutcome::Success { .. })
    }
}

/// 每个已处理标的一条结果，顺序与请求一致
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<SymbolOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.symbol()).collect()
    }
}
