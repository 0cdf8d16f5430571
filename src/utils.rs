/// Shared text helpers for crawled facility pages
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Placeholder written when a date is absent from the page payload
pub const MISSING_DATE: &str = "N/A";

/// Placeholder written when a date is present but unparseable
pub const INVALID_DATE: &str = "Invalid Date";

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"</?[^>]+>").expect("static tag pattern compiles"))
}

/// Strip HTML tags and non-ASCII characters from a text field
///
/// Facility descriptions come back from the site as HTML fragments with smart
/// quotes and other decoration. Only plain ASCII text is kept.
///
/// # Examples
///
/// ```
/// use datacenter_emissions::utils::clean_text;
///
/// assert_eq!(clean_text("<p>Tier III <b>facility</b></p>"), "Tier III facility");
/// assert_eq!(clean_text("  caf\u{e9} \u{2014} 10MW  "), "caf  10MW");
/// ```
pub fn clean_text(text: &str) -> String {
    let without_tags = tag_pattern().replace_all(text, "");
    without_tags
        .chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Convert an ISO-8601 timestamp to `YYYY-MM-DD`
///
/// Missing or empty input yields `N/A`, anything unparseable yields `Invalid Date`.
///
/// # Examples
///
/// ```
/// use datacenter_emissions::utils::format_date;
///
/// assert_eq!(format_date(Some("2021-06-03T14:22:01.000Z")), "2021-06-03");
/// assert_eq!(format_date(Some("2019-01-31")), "2019-01-31");
/// assert_eq!(format_date(Some("yesterday")), "Invalid Date");
/// assert_eq!(format_date(None), "N/A");
/// ```
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return MISSING_DATE.to_string();
    };

    parse_iso_date(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
