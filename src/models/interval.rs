//! Retention interval rules
//!
//! Each rule covers one calendar granularity (hour, day, week, month, year)
//! and keeps at most `max_count` snapshots, one per bucket.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HardsnapError;

/// Calendar granularity of a retention rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    Hour,
    Day,
    /// Weeks start on Monday
    Week,
    Month,
    Year,
}

impl IntervalKind {
    /// Approximate bucket size in days, used only to order rules
    pub fn ordering_weight(&self) -> f64 {
        match self {
            Self::Hour => 1.0 / 24.0,
            Self::Day => 1.0,
            Self::Week => 7.0,
            Self::Month => 30.0,
            Self::Year => 365.0,
        }
    }

    /// Start of the calendar bucket containing `instant`
    pub fn bucket_start(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let date = instant.date();
        match self {
            Self::Hour => date.and_time(NaiveTime::MIN) + Duration::hours(instant.hour() as i64),
            Self::Day => date.and_time(NaiveTime::MIN),
            Self::Week => {
                let offset = date.weekday().num_days_from_monday() as i64;
                (date - Duration::days(offset)).and_time(NaiveTime::MIN)
            }
            Self::Month => (date - Duration::days(date.day0() as i64)).and_time(NaiveTime::MIN),
            Self::Year => (date - Duration::days(date.ordinal0() as i64)).and_time(NaiveTime::MIN),
        }
    }

    /// The instant one second before the start of the bucket containing `instant`
    pub fn lower_boundary(&self, instant: NaiveDateTime) -> NaiveDateTime {
        self.bucket_start(instant) - Duration::seconds(1)
    }

    /// Capitalised name used in retention annotations
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hour => "Hour",
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IntervalKind {
    type Err = HardsnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hours" | "hourly" | "h" => Ok(Self::Hour),
            "day" | "days" | "daily" | "d" => Ok(Self::Day),
            "week" | "weeks" | "weekly" | "w" => Ok(Self::Week),
            "month" | "months" | "monthly" | "m" => Ok(Self::Month),
            "year" | "years" | "yearly" | "y" => Ok(Self::Year),
            other => Err(HardsnapError::Parse(format!(
                "Unknown interval '{}'. Use hour, day, week, month or year",
                other
            ))),
        }
    }
}

/// One retention tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRule {
    pub kind: IntervalKind,
    pub max_count: u32,
}

impl IntervalRule {
    pub fn new(kind: IntervalKind, max_count: u32) -> Self {
        Self { kind, max_count }
    }

    pub fn hour(max_count: u32) -> Self {
        Self::new(IntervalKind::Hour, max_count)
    }

    pub fn day(max_count: u32) -> Self {
        Self::new(IntervalKind::Day, max_count)
    }

    pub fn week(max_count: u32) -> Self {
        Self::new(IntervalKind::Week, max_count)
    }

    pub fn month(max_count: u32) -> Self {
        Self::new(IntervalKind::Month, max_count)
    }

    pub fn year(max_count: u32) -> Self {
        Self::new(IntervalKind::Year, max_count)
    }

    pub fn ordering_weight(&self) -> f64 {
        self.kind.ordering_weight()
    }

    pub fn lower_boundary(&self, instant: NaiveDateTime) -> NaiveDateTime {
        self.kind.lower_boundary(instant)
    }

    /// Whether `candidate` lies in the bucket that ends at `cursor`
    pub fn contains(&self, cursor: NaiveDateTime, candidate: NaiveDateTime) -> bool {
        self.lower_boundary(cursor) < candidate && candidate <= cursor
    }

    /// Parse a comma separated rule list such as `day=7,week=4,month=12`
    pub fn parse_list(s: &str) -> Result<Vec<Self>, HardsnapError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for IntervalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind.name().to_lowercase(), self.max_count)
    }
}

impl FromStr for IntervalRule {
    type Err = HardsnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, count) = s
            .split_once('=')
            .or_else(|| s.split_once(':'))
            .ok_or_else(|| {
                HardsnapError::Parse(format!("Invalid rule '{}'. Expected kind=count", s))
            })?;
        let kind: IntervalKind = kind.parse()?;
        let max_count = count.trim().parse::<u32>().map_err(|e| {
            HardsnapError::Parse(format!("Invalid count in rule '{}': {}", s, e))
        })?;
        Ok(Self::new(kind, max_count))
    }
}
