use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;

use crate::errors::{ForecastError, Result};
use crate::models::series::DateRange;

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

// 常见的纯日期格式，按优先级排序
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 解析用户输入的日期，失败时返回 InvalidDateFormat
pub fn normalize_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ForecastError::InvalidDateFormat(text.to_string()));
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime.date());
        }
    }

    // 带时区的时间取其本地日期
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }

    debug!("Unparseable date input: {:?}", text);
    Err(ForecastError::InvalidDateFormat(text.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

pub fn parse_date_range(start: &str, end: &str) -> Result<DateRange> {
    let start = normalize_date(start)?;
    let end = normalize_date(end)?;
    DateRange::new(start, end)
}

/// 拆分逗号分隔的标的列表，去掉空白和空项，最多保留 `max` 个
pub fn split_symbols(symbols: &str, max: usize) -> Vec<String> {
    symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}
