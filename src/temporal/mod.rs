//! Date ranges, calendar features and date arithmetic.

use crate::load::date_parser::{date_to_days, datetime_to_millis, days_to_date, parse_date, parse_datetime};
use crate::table::{access::array_str, column, with_column};
use anyhow::{anyhow, bail, Result};
use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Date32Array, Int64Array, StringArray, TimestampMillisecondArray,
    },
    compute::cast,
    datatypes::{DataType, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::sync::Arc;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// `periods` consecutive days starting at `start`, as `Date32`.
pub fn date_range(start: NaiveDate, periods: usize) -> ArrayRef {
    let first = date_to_days(start);
    Arc::new(Date32Array::from_iter_values(
        (0..periods as i32).map(|i| first + i),
    ))
}

/// `periods` timestamps `step` apart, as millisecond `Timestamp`.
pub fn datetime_range(start: NaiveDateTime, periods: usize, step: Duration) -> ArrayRef {
    let first = datetime_to_millis(start);
    let step = step.num_milliseconds();
    Arc::new(TimestampMillisecondArray::from_iter_values(
        (0..periods as i64).map(|i| first + i * step),
    ))
}

/// Read a date-like column as naive datetimes. Dates become midnight; text
/// is parsed as a datetime first, then as a date.
pub fn naive_datetimes(arr: &ArrayRef) -> Result<Vec<Option<NaiveDateTime>>> {
    match arr.data_type() {
        DataType::Date32 => {
            let days = arr
                .as_any()
                .downcast_ref::<Date32Array>()
                .ok_or_else(|| anyhow!("expected a Date32 array"))?;
            Ok(days
                .iter()
                .map(|d| d.and_then(days_to_date).and_then(|d| d.and_hms_opt(0, 0, 0)))
                .collect())
        }
        DataType::Date64 | DataType::Timestamp(_, _) => {
            let ms = cast(arr, &DataType::Timestamp(TimeUnit::Millisecond, None))?;
            let ms = ms
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| anyhow!("cast to Timestamp(ms) failed"))?;
            Ok(ms
                .iter()
                .map(|v| v.and_then(DateTime::from_timestamp_millis).map(|d| d.naive_utc()))
                .collect())
        }
        DataType::Utf8 | DataType::LargeUtf8 => Ok(array_str(arr)?
            .iter()
            .map(|v| {
                v.as_deref().and_then(|s| {
                    parse_datetime(s).or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
                })
            })
            .collect()),
        other => bail!("{} is not a date type", other),
    }
}

/// Calendar feature extracted by [`date_part`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    MonthName,
    Day,
    DayName,
    /// ISO-8601 week number.
    IsoWeek,
    Quarter,
    /// Monday = 0 … Sunday = 6.
    DayOfWeek,
    IsWeekend,
    Hour,
    /// `YYYY-MM`.
    MonthPeriod,
    /// `YYYYQn`.
    QuarterPeriod,
}

fn quarter(dt: &NaiveDateTime) -> u32 {
    (dt.month() - 1) / 3 + 1
}

fn int_part(dt: &NaiveDateTime, part: DatePart) -> Option<i64> {
    let v = match part {
        DatePart::Year => dt.year() as i64,
        DatePart::Month => dt.month() as i64,
        DatePart::Day => dt.day() as i64,
        DatePart::IsoWeek => dt.iso_week().week() as i64,
        DatePart::Quarter => quarter(dt) as i64,
        DatePart::DayOfWeek => dt.weekday().num_days_from_monday() as i64,
        DatePart::Hour => dt.hour() as i64,
        _ => return None,
    };
    Some(v)
}

fn text_part(dt: &NaiveDateTime, part: DatePart) -> Option<String> {
    match part {
        DatePart::MonthName => Some(MONTH_NAMES[dt.month0() as usize].to_string()),
        DatePart::DayName => {
            Some(DAY_NAMES[dt.weekday().num_days_from_monday() as usize].to_string())
        }
        DatePart::MonthPeriod => Some(format!("{:04}-{:02}", dt.year(), dt.month())),
        DatePart::QuarterPeriod => Some(format!("{}Q{}", dt.year(), quarter(dt))),
        _ => None,
    }
}

/// Add `name` holding `part` of the date-like column `source`.
pub fn date_part(batch: &RecordBatch, source: &str, part: DatePart, name: &str) -> Result<RecordBatch> {
    let dts = naive_datetimes(column(batch, source)?)?;
    let out: ArrayRef = match part {
        DatePart::IsWeekend => Arc::new(
            dts.iter()
                .map(|d| d.map(|d| d.weekday().num_days_from_monday() >= 5))
                .collect::<BooleanArray>(),
        ),
        DatePart::MonthName | DatePart::DayName | DatePart::MonthPeriod | DatePart::QuarterPeriod => {
            Arc::new(
                dts.iter()
                    .map(|d| d.as_ref().and_then(|d| text_part(d, part)))
                    .collect::<StringArray>(),
            )
        }
        _ => Arc::new(
            dts.iter()
                .map(|d| d.as_ref().and_then(|d| int_part(d, part)))
                .collect::<Int64Array>(),
        ),
    };
    with_column(batch, name, out)
}

/// Several [`date_part`] extractions in one go.
pub fn date_parts(batch: &RecordBatch, source: &str, parts: &[(DatePart, &str)]) -> Result<RecordBatch> {
    parts
        .iter()
        .try_fold(batch.clone(), |acc, (part, name)| date_part(&acc, source, *part, name))
}

fn day_offsets<F>(batch: &RecordBatch, source: &str, name: &str, f: F) -> Result<RecordBatch>
where
    F: Fn(NaiveDateTime, NaiveDateTime, NaiveDateTime) -> i64,
{
    let dts = naive_datetimes(column(batch, source)?)?;
    let present = dts.iter().flatten();
    let (Some(min), Some(max)) = (present.clone().min().copied(), present.max().copied()) else {
        let nulls: Int64Array = dts.iter().map(|_| None::<i64>).collect();
        return with_column(batch, name, Arc::new(nulls));
    };
    let out: Int64Array = dts.iter().map(|d| d.map(|d| f(d, min, max))).collect();
    with_column(batch, name, Arc::new(out))
}

/// Whole days since the earliest date in the column.
pub fn days_since_min(batch: &RecordBatch, source: &str, name: &str) -> Result<RecordBatch> {
    day_offsets(batch, source, name, |d, min, _| (d - min).num_days())
}

/// Whole days until the latest date in the column.
pub fn days_until_max(batch: &RecordBatch, source: &str, name: &str) -> Result<RecordBatch> {
    day_offsets(batch, source, name, |d, _, max| (max - d).num_days())
}

/// `name = to - from` in whole days.
pub fn diff_days(batch: &RecordBatch, from: &str, to: &str, name: &str) -> Result<RecordBatch> {
    let a = naive_datetimes(column(batch, from)?)?;
    let b = naive_datetimes(column(batch, to)?)?;
    let out: Int64Array = a
        .iter()
        .zip(&b)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some((*b - *a).num_days()),
            _ => None,
        })
        .collect();
    with_column(batch, name, Arc::new(out))
}

/// Truncate a date-like column to `Date32`.
pub fn to_dates(batch: &RecordBatch, source: &str) -> Result<RecordBatch> {
    let out: Date32Array = naive_datetimes(column(batch, source)?)?
        .iter()
        .map(|d| d.map(|d| date_to_days(d.date())))
        .collect();
    with_column(batch, source, Arc::new(out))
}
