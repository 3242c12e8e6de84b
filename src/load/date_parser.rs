use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Fast parse of `"YYYY-MM-DD"` (or `"YYYY/MM/DD"`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // exact length + matching separators
    if s.len() != 10 || !s.is_ascii() {
        return None;
    }
    let sep = &s[4..5];
    if (sep != "-" && sep != "/") || &s[7..8] != sep {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: u32 = s[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `"YYYY-MM-DD HH:MM:SS"` with optional `T` separator and fractional seconds.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.len() < 19 {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since 1970-01-01, the `Date32` representation.
pub fn date_to_days(d: NaiveDate) -> i32 {
    d.signed_duration_since(epoch()).num_days() as i32
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(chrono::Duration::days(days as i64))
}

/// Milliseconds since the epoch, treating the naive value as UTC.
pub fn datetime_to_millis(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}
