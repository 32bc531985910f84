//! Splitting the alias off a command text and picking up a leading date-time.
//!
//! Extraction is best effort: text that does not start with a date-time, or
//! whose numbers do not form a valid one, yields `None` and never an error.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// `YY[YY]/MM/DD HH:MM` or `YY[YY]-MM-DD HH:MM` at the start of the text.
static LEADING_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{2,4}/\d{1,2}/\d{1,2}|\d{2,4}-\d{1,2}-\d{1,2})\s\d{1,2}:\d{2}")
        .expect("leading datetime pattern is valid")
});

const FULL_YEAR_WIDTH: usize = 4;
const SHORT_YEAR_WIDTH: usize = 2;

/// Text left after removing the alias, and whether the alias was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedText {
    pub text: String,
    pub stripped: bool,
}

/// First whitespace-delimited token of the text.
pub fn leading_alias(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Split `raw` at the first occurrence of `alias` and keep what follows.
///
/// When the alias does not occur, the trimmed text comes back unchanged with
/// `stripped == false`.
pub fn split_alias(raw: &str, alias: &str) -> StrippedText {
    if !alias.is_empty() {
        if let Some((_, rest)) = raw.split_once(alias) {
            return StrippedText {
                text: rest.trim().to_string(),
                stripped: true,
            };
        }
    }
    debug!(alias, raw, "Alias not found in command text, passing text through");
    StrippedText {
        text: raw.trim().to_string(),
        stripped: false,
    }
}

pub fn strip_alias(raw: &str, alias: &str) -> String {
    split_alias(raw, alias).text
}

/// Prefix the year to `MM/DD HH:MM` (or `MM-DD HH:MM`) shorthand.
pub fn with_current_year(text: &str, year: i32) -> String {
    if text.contains(':') {
        if text.matches('/').count() == 1 {
            return format!("{year}/{text}");
        }
        if text.matches('-').count() == 1 {
            return format!("{year}-{text}");
        }
    }
    text.to_string()
}

/// Parse a date-time at the very start of `text` and attach `offset` to it.
pub fn extract_leading_datetime(text: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let Some(found) = LEADING_DATETIME.find(text) else {
        warn!(text, "Unable to find datetime in text");
        return None;
    };
    let candidate = found.as_str();

    let Some(format) = select_format(candidate) else {
        warn!(candidate, "Unsupported year width in datetime");
        return None;
    };

    match NaiveDateTime::parse_from_str(candidate, format) {
        Ok(naive) => naive.and_local_timezone(offset).single(),
        Err(err) => {
            warn!(candidate, error = %err, "Unable to parse datetime");
            None
        }
    }
}

/// Date-time for an attendance entry, accepting the year-less shorthand.
pub fn datetime_from_text(text: &str, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    extract_leading_datetime(&with_current_year(text, now.year()), *now.offset())
}

fn select_format(candidate: &str) -> Option<&'static str> {
    let separator = if candidate.contains('/') { '/' } else { '-' };
    let year_width = candidate.split(separator).next().map_or(0, str::len);
    match (separator, year_width) {
        ('/', FULL_YEAR_WIDTH) => Some("%Y/%m/%d %H:%M"),
        ('/', SHORT_YEAR_WIDTH) => Some("%y/%m/%d %H:%M"),
        ('-', FULL_YEAR_WIDTH) => Some("%Y-%m-%d %H:%M"),
        ('-', SHORT_YEAR_WIDTH) => Some("%y-%m-%d %H:%M"),
        _ => None,
    }
}
