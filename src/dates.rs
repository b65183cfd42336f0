//! Best-effort date extraction from free text.
//!
//! Source documents carry dates in prose ("Amended as of March 3, 2021").
//! Extraction is an ordered chain of strategies tried in sequence; the
//! first one that matches wins and the result is normalized to ISO
//! `YYYY-MM-DD`. No match leaves the field unset; dates are never
//! fabricated.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap())
}

fn full_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),?\s+(\d{4})",
        )
        .unwrap()
    })
}

fn abbrev_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\.?\s+(\d{1,2}),?\s+(\d{4})")
            .unwrap()
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})").unwrap())
}

fn try_iso(text: &str) -> Option<NaiveDate> {
    let caps = iso_re().captures(text)?;
    NaiveDate::parse_from_str(
        &format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]),
        "%Y-%m-%d",
    )
    .ok()
}

fn try_full_month(text: &str) -> Option<NaiveDate> {
    let caps = full_month_re().captures(text)?;
    NaiveDate::parse_from_str(
        &format!("{} {} {}", &caps[1], &caps[2], &caps[3]),
        "%B %d %Y",
    )
    .ok()
}

fn try_abbrev_month(text: &str) -> Option<NaiveDate> {
    let caps = abbrev_month_re().captures(text)?;
    NaiveDate::parse_from_str(
        &format!("{} {} {}", &caps[1], &caps[2], &caps[3]),
        "%b %d %Y",
    )
    .ok()
}

fn try_numeric(text: &str) -> Option<NaiveDate> {
    let caps = numeric_re().captures(text)?;
    // US order: month first.
    NaiveDate::parse_from_str(
        &format!("{}/{}/{}", &caps[1], &caps[2], &caps[3]),
        "%m/%d/%Y",
    )
    .ok()
}

/// Extraction strategies in priority order. ISO wins over month-name
/// forms, which win over ambiguous numeric forms.
const STRATEGIES: [fn(&str) -> Option<NaiveDate>; 4] =
    [try_iso, try_full_month, try_abbrev_month, try_numeric];

/// Extract the first recognizable date from `text`, normalized to ISO
/// `YYYY-MM-DD`. Returns `None` when no strategy matches.
pub fn extract_date(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    STRATEGIES
        .iter()
        .find_map(|try_extract| try_extract(text))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_passthrough() {
        assert_eq!(extract_date("2023-01-31"), Some("2023-01-31".to_string()));
        assert_eq!(extract_date("2023-1-5"), Some("2023-01-05".to_string()));
    }

    #[test]
    fn full_month_name() {
        assert_eq!(
            extract_date("March 3, 2021"),
            Some("2021-03-03".to_string())
        );
        assert_eq!(
            extract_date("as of January 31 2023 the part was revised"),
            Some("2023-01-31".to_string())
        );
    }

    #[test]
    fn abbreviated_month_name() {
        assert_eq!(extract_date("Jan. 31, 2023"), Some("2023-01-31".to_string()));
        assert_eq!(extract_date("Sep 9, 2020"), Some("2020-09-09".to_string()));
    }

    #[test]
    fn numeric_us_order() {
        assert_eq!(extract_date("03/04/2021"), Some("2021-03-04".to_string()));
        assert_eq!(extract_date("01-31-2023"), Some("2023-01-31".to_string()));
    }

    #[test]
    fn first_strategy_wins() {
        // Both an ISO date and a month-name date present: ISO is tried first.
        assert_eq!(
            extract_date("revised March 3, 2021; published 2020-12-01"),
            Some("2020-12-01".to_string())
        );
    }

    #[test]
    fn no_date_leaves_unset() {
        assert_eq!(extract_date(""), None);
        assert_eq!(extract_date("no date here"), None);
        // An invalid calendar date must not be fabricated.
        assert_eq!(extract_date("13/45/2021"), None);
    }
}
