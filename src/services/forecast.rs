use crate::errors::{ForecastError, Result};
use crate::models::series::{Forecast, ForecastPoint, PriceSeries};
use chrono::{Datelike, Days, NaiveDate};
use log::debug;

/// 80% 双侧区间的 z 值
const INTERVAL_Z: f64 = 1.2816;

/// 历史至少覆盖两周才拟合周季节性
const MIN_SEASONAL_SPAN_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// 拟合方法；相同的序列必须得到相同的模型
pub trait ForecastModel: Send + Sync {
    fn fit(&self, series: &PriceSeries) -> Result<Box<dyn FittedModel>>;
}

pub trait FittedModel {
    fn predict(&self, date: NaiveDate) -> Prediction;
}

/// 加法模型：线性趋势 + 周季节性
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveModel;

struct AdditiveFit {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    weekly: Option<[f64; 7]>,
    residual_std: f64,
}

impl AdditiveFit {
    fn trend(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        self.intercept + self.slope * t
    }

    fn seasonal(&self, date: NaiveDate) -> f64 {
        self.weekly
            .map(|w| w[date.weekday().num_days_from_monday() as usize])
            .unwrap_or(0.0)
    }
}

impl FittedModel for AdditiveFit {
    fn predict(&self, date: NaiveDate) -> Prediction {
        let value = self.trend(date) + self.seasonal(date);
        let spread = INTERVAL_Z * self.residual_std;
        Prediction {
            value,
            lower: value - spread,
            upper: value + spread,
        }
    }
}

impl ForecastModel for AdditiveModel {
    fn fit(&self, series: &PriceSeries) -> Result<Box<dyn FittedModel>> {
        let origin = series.first_date().ok_or(ForecastError::EmptySeries)?;
        let n = series.len() as f64;

        let ts: Vec<f64> = series.observations.iter()
            .map(|o| (o.timestamp - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = series.observations.iter().map(|o| o.close).collect();

        let t_mean = ts.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;
        let sxx: f64 = ts.iter().map(|t| (t - t_mean).powi(2)).sum();
        let sxy: f64 = ts.iter().zip(&ys).map(|(t, y)| (t - t_mean) * (y - y_mean)).sum();

        if sxx <= f64::EPSILON {
            return Err(ForecastError::ModelFitFailure(format!(
                "{} observations share a single date", series.len()
            )));
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * t_mean;

        let mut fit = AdditiveFit {
            origin,
            intercept,
            slope,
            weekly: None,
            residual_std: 0.0,
        };

        let span = ts.last().copied().unwrap_or(0.0) as i64;
        if span >= MIN_SEASONAL_SPAN_DAYS {
            let mut sums = [0.0; 7];
            let mut counts = [0usize; 7];
            for obs in &series.observations {
                let day = obs.timestamp.weekday().num_days_from_monday() as usize;
                sums[day] += obs.close - fit.trend(obs.timestamp);
                counts[day] += 1;
            }
            let mut weekly = [0.0; 7];
            for day in 0..7 {
                if counts[day] > 0 {
                    weekly[day] = sums[day] / counts[day] as f64;
                }
            }
            fit.weekly = Some(weekly);
        }

        if series.len() > 2 {
            let sse: f64 = series.observations.iter()
                .map(|o| (o.close - fit.predict(o.timestamp).value).powi(2))
                .sum();
            fit.residual_std = (sse / (n - 2.0)).sqrt();
        }

        if !(fit.intercept.is_finite() && fit.slope.is_finite() && fit.residual_std.is_finite()) {
            return Err(ForecastError::ModelFitFailure("non-finite model parameters".to_string()));
        }

        debug!("Fitted {}: slope {:.4}/day, residual std {:.4}, weekly {}",
               series.symbol, fit.slope, fit.residual_std, fit.weekly.is_some());
        Ok(Box::new(fit))
    }
}

/// 拟合价格序列并向后预测
pub struct ForecastEngine {
    model: Box<dyn ForecastModel>,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(Box::new(AdditiveModel))
    }
}

impl ForecastEngine {
    pub fn new(model: Box<dyn ForecastModel>) -> Self {
        Self { model }
    }

    /// 预测结果覆盖全部历史日期，加上最后一个历史日期之后的 `horizon` 个自然日
    pub fn forecast(&self, series: &PriceSeries, horizon: usize) -> Result<Forecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon(0));
        }
        if series.len() < 2 {
            return Err(ForecastError::ModelFitFailure(format!(
                "need at least 2 observations for {}, got {}", series.symbol, series.len()
            )));
        }

        let last = series.last_date().ok_or(ForecastError::EmptySeries)?;
        // 先确认最后一个预测日期有效，再分配空间
        last.checked_add_days(Days::new(horizon as u64)).ok_or_else(|| {
            ForecastError::ModelFitFailure(format!("horizon of {} days overflows the calendar", horizon))
        })?;

        let fitted = self.model.fit(series)?;

        let mut points = Vec::with_capacity(series.len());
        for obs in &series.observations {
            points.push(to_point(obs.timestamp, fitted.predict(obs.timestamp), false));
        }
        points.extend((1..=horizon as u64).map(|offset| {
            let date = last + Days::new(offset);
            to_point(date, fitted.predict(date), true)
        }));

        Ok(Forecast { horizon, points })
    }
}

fn to_point(timestamp: NaiveDate, prediction: Prediction, is_future: bool) -> ForecastPoint {
    ForecastPoint {
        timestamp,
        predicted_value: prediction.value,
        lower_bound: prediction.lower,
        upper_bound: prediction.upper,
        is_future,
    }
}
