use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Date formats tried in order; the first that parses wins.
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];
const DATETIME_FORMAT: &str = "%Y%m%d;%H%M%S";
const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

lazy_static! {
    static ref PER_SHARE_RATE: Regex =
        Regex::new(r"(?i)\b([A-Z]{3})\s+([0-9]+(?:\.[0-9]+)?)\s+PER\s+SHARE\b")
            .unwrap();
}

/// Parses a statement date from any of the supported source formats.
///
/// Returns `None` when nothing parses; the caller decides whether that is
/// fatal for the row.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT) {
        return Some(datetime.date());
    }
    NaiveDate::parse_from_str(value, COMPACT_DATE_FORMAT).ok()
}

/// Parses a money or quantity value.
///
/// Strips thousands separators and currency symbols. Placeholder sentinels
/// (dash, empty, "N/A") come back as `None`, keeping "unknown" distinct from
/// "known zero".
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if matches!(trimmed, "" | "-" | "--" | "N/A" | "n/a" | "NA") {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '€' | '£'))
        .collect();
    Decimal::from_str(cleaned.trim()).ok()
}

/// Extracts a per-share rate from a free-text dividend description, e.g.
/// `"ACME CORP DIVIDEND USD 0.84 PER SHARE"` yields `0.84`.
pub fn extract_per_share_rate(description: &str) -> Option<Decimal> {
    PER_SHARE_RATE
        .captures(description)
        .and_then(|captures| captures.get(2))
        .and_then(|rate| Decimal::from_str(rate.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_each_supported_date_format() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date("07/03/2024"), Some(expected));
        assert_eq!(parse_date("2024-03-07"), Some(expected));
        assert_eq!(parse_date("20240307;143000"), Some(expected));
        assert_eq!(parse_date("20240307"), Some(expected));
    }

    #[test]
    fn unparseable_date_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024/03/07"), None);
    }

    #[test]
    fn decimal_strips_separators_and_currency_symbols() {
        assert_eq!(parse_decimal("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_decimal("$ 99.90"), Some(dec!(99.90)));
        assert_eq!(parse_decimal("-42.5"), Some(dec!(-42.5)));
    }

    #[test]
    fn sentinel_decimals_are_none_not_zero() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("--"), None);
        assert_eq!(parse_decimal("N/A"), None);
        assert_eq!(parse_decimal("n/a"), None);
        assert_eq!(parse_decimal("0"), Some(dec!(0)));
    }

    #[test]
    fn per_share_rate_extracted_from_description() {
        assert_eq!(
            extract_per_share_rate("ACME CORP CASH DIVIDEND USD 0.84 PER SHARE"),
            Some(dec!(0.84))
        );
        assert_eq!(
            extract_per_share_rate("gbp 1.2 per share (interim)"),
            Some(dec!(1.2))
        );
        assert_eq!(extract_per_share_rate("ACME CORP CASH DIVIDEND"), None);
    }
}
