use std::fmt::{Display, Formatter};

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

/// Canonical start of a bucket: the day itself, the Monday of its week or
/// the first of its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(NaiveDate);

impl BucketKey {
    pub fn start_date(&self) -> NaiveDate {
        self.0
    }
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollingRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub label: String,
}

pub fn derive_bucket_key(date: NaiveDate, granularity: Granularity) -> BucketKey {
    match granularity {
        Granularity::Day => BucketKey(date),
        Granularity::Week => BucketKey(start_of_week(date)),
        Granularity::Month => BucketKey(first_day_of_month(date)),
    }
}

pub fn bucket_label(key: BucketKey, granularity: Granularity) -> String {
    let date = key.start_date();
    match granularity {
        Granularity::Day => date.format("%a %b %-d").to_string(),
        Granularity::Week => format!("Week of {}", date.format("%b %-d")),
        Granularity::Month => date.format("%B %Y").to_string(),
    }
}

/// Every bucket key from the bucket holding `start_date` through the bucket
/// holding `end_date`, zero-total buckets included. An inverted range yields
/// an empty list. Enumeration stops at the last representable bucket.
pub fn enumerate_buckets(
    granularity: Granularity,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<BucketKey> {
    let first = derive_bucket_key(start_date, granularity);
    let last = derive_bucket_key(end_date, granularity);

    let mut buckets = Vec::new();
    let mut cursor = Some(first);
    while let Some(key) = cursor.filter(|key| *key <= last) {
        buckets.push(key);
        cursor = next_bucket(key, granularity);
    }

    buckets
}

/// The period `offset` steps away from the one containing `today`, or `None`
/// when that period falls outside the supported calendar.
///
/// Callers keep `offset <= 0`; future periods are computed the same way but
/// are never requested by the reporting views.
pub fn rolling_range(
    granularity: Granularity,
    offset: i32,
    today: NaiveDate,
) -> Option<RollingRange> {
    let (start_date, end_date) = match granularity {
        Granularity::Day => {
            let day = today.checked_add_signed(Duration::try_days(offset.into())?)?;
            (day, day)
        }
        Granularity::Week => {
            let start =
                start_of_week(today).checked_add_signed(Duration::try_weeks(offset.into())?)?;
            (start, start.checked_add_signed(Duration::days(6))?)
        }
        Granularity::Month => {
            let start = shift_month(first_day_of_month(today), offset)?;
            let end = NaiveDate::from_ymd_opt(
                start.year(),
                start.month(),
                days_in_month(start.year(), start.month()),
            )?;
            (start, end)
        }
    };

    let label = match (granularity, offset) {
        (Granularity::Day, 0) => "Today".to_string(),
        (Granularity::Day, -1) => "Yesterday".to_string(),
        (Granularity::Week, 0) => "This week".to_string(),
        (Granularity::Week, -1) => "Last week".to_string(),
        (Granularity::Month, 0) => "This month".to_string(),
        (Granularity::Month, -1) => "Last month".to_string(),
        _ => bucket_label(derive_bucket_key(start_date, granularity), granularity),
    };

    Some(RollingRange {
        start_date,
        end_date,
        label,
    })
}

pub fn rolling_range_from_today(granularity: Granularity, offset: i32) -> Option<RollingRange> {
    rolling_range(granularity, offset, Local::now().date_naive())
}

fn next_bucket(key: BucketKey, granularity: Granularity) -> Option<BucketKey> {
    let date = key.start_date();
    let next = match granularity {
        Granularity::Day => date.succ_opt(),
        Granularity::Week => date.checked_add_signed(Duration::weeks(1)),
        Granularity::Month => shift_month(date, 1),
    };
    next.map(BucketKey)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|&day| NaiveDate::from_ymd_opt(year, month, day).is_some())
        .unwrap_or(28)
}

fn first_day_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

// The first week of the calendar is cut short at its first day.
fn start_of_week(day: NaiveDate) -> NaiveDate {
    let days_from_monday = day.weekday().num_days_from_monday() as i64;
    day.checked_sub_signed(Duration::days(days_from_monday))
        .unwrap_or(NaiveDate::MIN)
}

fn shift_month(day: NaiveDate, delta: i32) -> Option<NaiveDate> {
    let months = i64::from(day.year()) * 12 + i64::from(day.month0()) + i64::from(delta);
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = months.rem_euclid(12) as u32 + 1;
    let target_day = day.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, target_day)
}
