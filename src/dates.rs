use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

/// Shown wherever a date is missing or unreadable.
pub const SENTINEL: &str = "-";

/// Ecuador runs on UTC-05:00 all year.
const ECUADOR_UTC_OFFSET_SECS: i32 = 5 * 3600;

const DATE_FORMAT: &str = "%d/%m/%Y";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Missing,
    Date(NaiveDate),
    /// Wall-clock time already in the display timezone.
    Local(NaiveDateTime),
    Instant(DateTime<FixedOffset>),
    Text(String),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Date(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Local(value)
    }
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(value: DateTime<FixedOffset>) -> Self {
        DateInput::Instant(value)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::Instant(value.fixed_offset())
    }
}

impl<T: Into<DateInput>> From<Option<T>> for DateInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DateInput::Missing)
    }
}

pub fn ecuador_offset() -> FixedOffset {
    FixedOffset::west_opt(ECUADOR_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn format_date(input: impl Into<DateInput>) -> String {
    format_date_in(input, ecuador_offset())
}

pub fn format_date_time(input: impl Into<DateInput>) -> String {
    format_date_time_in(input, ecuador_offset())
}

pub fn format_date_in(input: impl Into<DateInput>, offset: FixedOffset) -> String {
    render(input.into(), offset, DATE_FORMAT)
}

pub fn format_date_time_in(input: impl Into<DateInput>, offset: FixedOffset) -> String {
    render(input.into(), offset, DATE_TIME_FORMAT)
}

fn render(input: DateInput, offset: FixedOffset, format: &str) -> String {
    match normalize(input, offset) {
        Some(local) => local.format(format).to_string(),
        None => SENTINEL.to_string(),
    }
}

/// Resolves the input to wall-clock time at `offset`.
fn normalize(input: DateInput, offset: FixedOffset) -> Option<NaiveDateTime> {
    match input {
        DateInput::Missing => None,
        DateInput::Date(date) => date.and_hms_opt(0, 0, 0),
        DateInput::Local(local) => Some(local),
        DateInput::Instant(instant) => {
            Some(offset.from_utc_datetime(&instant.naive_utc()).naive_local())
        }
        DateInput::Text(text) => parse_text(text.trim(), offset),
    }
}

fn parse_text(text: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return normalize(DateInput::Instant(instant), offset);
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(text, format) {
            return Some(local);
        }
    }

    // Date-only strings are calendar days, not midnight UTC.
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    DateTime::parse_from_rfc2822(text)
        .ok()
        .and_then(|instant| normalize(DateInput::Instant(instant), offset))
}
