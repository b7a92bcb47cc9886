use crate::error::{PlanningError, Result};
use chrono::{Datelike, NaiveDate};

pub const THOUSANDS_SEPARATOR: char = ' ';

/// Figures are rounded to at most this many fraction digits.
pub const MAX_FRACTION_DIGITS: usize = 3;

/// Formats a budget figure with a separator every three integer digits.
///
/// `None` and `NaN` render as `"0"`. Fractions are rounded to
/// [`MAX_FRACTION_DIGITS`] digits and trailing zeros are dropped.
///
/// # Examples
/// - `1234567.0` -> `"1 234 567"`
/// - `-1234.5` -> `"-1 234.5"`
/// - `0.1 + 0.2` -> `"0.3"`
pub fn format_number(value: Option<f64>) -> String {
    let value = match value {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => return "0".to_string(),
    };

    let rounded = format!("{:.*}", MAX_FRACTION_DIGITS, value);
    let raw = rounded.trim_end_matches('0').trim_end_matches('.');
    if raw == "0" || raw == "-0" {
        return "0".to_string();
    }

    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(ch);
    }

    match fraction {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn format_amount(value: f64) -> String {
    format_number(Some(value))
}

/// Reads back a formatted figure; anything unparseable counts as zero.
pub fn parse_formatted(text: &str) -> f64 {
    crate::schema::parse_amount(text).unwrap_or(0.0)
}

/// Parses the `D.M.YYYY` date strings used for project schedule estimates.
pub fn parse_finnish_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d.%m.%Y").map_err(|_| PlanningError::DateParse {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_finnish_date(field, v).map(Some),
    }
}

/// Returns the (first, last) month a span covers in `year`, if the year is
/// within the span.
///
/// The month window is the same in every year of the span: it opens at the
/// start month and closes at the end month, or in December when the span
/// ends in a later year than it starts.
pub fn months_within_year(start: NaiveDate, end: NaiveDate, year: i32) -> Option<(u32, u32)> {
    if start.year() > year || end.year() < year {
        return None;
    }

    let end_month = if end.year() > start.year() { 12 } else { end.month() };

    Some((start.month(), end_month))
}

/// True when `[start, end]` overlaps `[window_start, window_end]`.
pub fn years_overlap(start: i32, end: i32, window_start: i32, window_end: i32) -> bool {
    start <= window_end && end >= window_start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(1_234_567.0)), "1 234 567");
        assert_eq!(format_number(Some(5000.0)), "5 000");
        assert_eq!(format_number(Some(110.0)), "110");
        assert_eq!(format_number(Some(0.0)), "0");
        assert_eq!(format_number(None), "0");
        assert_eq!(format_number(Some(f64::NAN)), "0");
    }

    #[test]
    fn test_format_number_sign_and_fraction() {
        assert_eq!(format_number(Some(-1234.0)), "-1 234");
        assert_eq!(format_number(Some(-123.0)), "-123");
        assert_eq!(format_number(Some(1234.25)), "1 234.25");
        assert_eq!(format_number(Some(999_999.0)), "999 999");
        assert_eq!(format_number(Some(f64::INFINITY)), "0");
    }

    #[test]
    fn test_format_number_rounds_float_noise() {
        assert_eq!(format_number(Some(0.1 + 0.2)), "0.3");
        assert_eq!(format_number(Some(1000.3 - 0.1)), "1 000.2");
        assert_eq!(format_number(Some(120.5 + 0.25)), "120.75");
        assert_eq!(format_number(Some(2.0 / 3.0)), "0.667");
        assert_eq!(format_number(Some(-0.0001)), "0");
        assert_eq!(format_number(Some(1_999.9999)), "2 000");
    }

    #[test]
    fn test_parse_formatted() {
        assert_eq!(parse_formatted("1 234 567"), 1_234_567.0);
        assert_eq!(parse_formatted("-1 234.5"), -1234.5);
        assert_eq!(parse_formatted("n/a"), 0.0);
    }

    #[test]
    fn test_parse_finnish_date() {
        assert_eq!(
            parse_finnish_date("estPlanningStart", "1.6.2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert_eq!(
            parse_finnish_date("estPlanningStart", "31.12.2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert!(parse_finnish_date("estPlanningStart", "2025-06-01").is_err());
        assert_eq!(parse_optional_date("estPlanningEnd", Some("")).unwrap(), None);
    }

    #[test]
    fn test_months_within_year() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        assert_eq!(months_within_year(start, end, 2024), None);
        assert_eq!(months_within_year(start, end, 2025), Some((6, 12)));
        assert_eq!(months_within_year(start, end, 2026), Some((6, 12)));
        assert_eq!(months_within_year(start, end, 2027), None);
    }

    #[test]
    fn test_months_within_single_year_span() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
        assert_eq!(months_within_year(start, end, 2025), Some((3, 9)));
    }

    #[test]
    fn test_years_overlap() {
        assert!(years_overlap(2023, 2025, 2025, 2027));
        assert!(years_overlap(2026, 2030, 2025, 2027));
        assert!(!years_overlap(2020, 2024, 2025, 2027));
    }
}
