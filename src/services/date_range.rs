// src/services/date_range.rs
use chrono::{Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_REPORTING_TZ: Tz = chrono_tz::America::Chicago;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Yesterday,
    Last7Days,
    Last28Days,
    Last30Days,
    Last90Days,
    ThisMonth,
    LastMonth,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRange {
    pub label: DateRange,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ResolvedRange {
    /// `YYYY-MM-DD` pair as stored in cache keys.
    pub fn date_strings(&self) -> (String, String) {
        (
            self.start_date.format("%Y-%m-%d").to_string(),
            self.end_date.format("%Y-%m-%d").to_string(),
        )
    }
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::Last7Days => "last_7_days",
            DateRange::Last28Days => "last_28_days",
            DateRange::Last30Days => "last_30_days",
            DateRange::Last90Days => "last_90_days",
            DateRange::ThisMonth => "this_month",
            DateRange::LastMonth => "last_month",
            DateRange::Custom => "custom",
        }
    }

    /// Inclusive bounds relative to `today`. Trailing-N ranges end yesterday
    /// since the current day is still incomplete upstream.
    ///
    /// `custom` only resolves when both explicit dates are given.
    pub fn resolve(
        &self,
        today: NaiveDate,
        custom: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<ResolvedRange, String> {
        let yesterday = today - Duration::days(1);
        let trailing = |days: i64| (yesterday - Duration::days(days - 1), yesterday);

        let (start_date, end_date) = match self {
            DateRange::Today => (today, today),
            DateRange::Yesterday => (yesterday, yesterday),
            DateRange::Last7Days => trailing(7),
            DateRange::Last28Days => trailing(28),
            DateRange::Last30Days => trailing(30),
            DateRange::Last90Days => trailing(90),
            DateRange::ThisMonth => (first_of_month(today), today),
            DateRange::LastMonth => {
                let end = first_of_month(today) - Duration::days(1);
                (first_of_month(end), end)
            }
            DateRange::Custom => match custom {
                Some((start, end)) if start <= end => (start, end),
                Some((start, end)) => {
                    return Err(format!("start date {} is after end date {}", start, end))
                }
                None => return Err("custom range requires start and end dates".to_string()),
            },
        };

        Ok(ResolvedRange {
            label: *self,
            start_date,
            end_date,
        })
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateRange::Today),
            "yesterday" => Ok(DateRange::Yesterday),
            "last_7_days" | "7d" => Ok(DateRange::Last7Days),
            "last_28_days" | "28d" => Ok(DateRange::Last28Days),
            "last_30_days" | "30d" => Ok(DateRange::Last30Days),
            "last_90_days" | "90d" => Ok(DateRange::Last90Days),
            "this_month" => Ok(DateRange::ThisMonth),
            "last_month" => Ok(DateRange::LastMonth),
            "custom" => Ok(DateRange::Custom),
            other => Err(format!("unknown date range: {}", other)),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date {}: {}", s, e))
}

/// Current calendar day in the reporting timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}
