//! Capture time embedded in camera file names.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// `YYYY-MM-DD-hh-mm-ss` immediately before the `.jpg` extension.
static CAPTURE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2})\.jpg").expect("capture time pattern is valid")
});

const CAPTURE_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Extract the UTC capture time from a file name.
///
/// Returns `None` when the name carries no timestamp or the digits do not
/// form a real date and time.
///
/// # Examples
///
/// ```
/// use core_sampler::parse_capture_time;
///
/// let ts = parse_capture_time("img2024-03-01-12-30-00.jpg").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:00+00:00");
///
/// assert!(parse_capture_time("holiday.jpg").is_none());
/// ```
pub fn parse_capture_time(name: &str) -> Option<DateTime<Utc>> {
    let captured = CAPTURE_TIME.captures(name)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(captured, CAPTURE_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
