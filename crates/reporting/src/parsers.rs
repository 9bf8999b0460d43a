//! Tolerant parsers for pt-BR formatted spreadsheet cells.
//!
//! `.` is always the thousands separator and `,` the decimal separator.
//! Anything unparseable becomes `0` (or `None` for dates); nothing here
//! returns an error.

use chrono::{Datelike, NaiveDate};

const CURRENCY_SYMBOLS: [&str; 4] = ["R$", "US$", "$", "€"];

/// `"R$ 1.234,56"` -> `1234.56`. Empty or garbage input -> `0.0`.
pub fn parse_locale_currency(raw: &str) -> f64 {
    let mut stripped = raw.trim().to_string();
    for symbol in CURRENCY_SYMBOLS {
        stripped = stripped.replace(symbol, "");
    }
    parse_decimal(&stripped)
}

/// `"1.234"` -> `1234`. A decimal part after `,` is truncated; negative or
/// unparseable input -> `0`.
pub fn parse_locale_integer(raw: &str) -> u64 {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let without_thousands = compact.replace('.', "");
    let integer_part = without_thousands.split(',').next().unwrap_or_default();
    integer_part.parse::<u64>().unwrap_or(0)
}

/// `"12,5%"` -> `12.5`.
pub fn parse_locale_percent(raw: &str) -> f64 {
    parse_decimal(&raw.replace('%', ""))
}

fn parse_decimal(raw: &str) -> f64 {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = compact.replace('.', "").replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Calendar date from `dd/mm/yyyy`, `d/m/yy`, `dd-mm-yyyy`, `yyyy-mm-dd` or
/// an ISO timestamp prefix. Built from explicit components, so no timezone
/// is ever involved.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw
        .trim()
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()?;
    let parts: Vec<&str> = date_part.split(|c: char| c == '/' || c == '-').collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };

    if first.len() == 4 {
        let year = first.parse::<i32>().ok()?;
        let month = second.parse::<u32>().ok()?;
        let day = third.parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    } else {
        let day = first.parse::<u32>().ok()?;
        let month = second.parse::<u32>().ok()?;
        let year = expand_year(third)?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

/// First day of the month named by `raw`: `2025-09`, `09/2025`,
/// `Setembro/2025`, `set 25`, `September 2025`, or any full date.
pub fn parse_report_month(raw: &str) -> Option<NaiveDate> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if let Some(date) = parse_sheet_date(raw) {
        return NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
    }

    let parts: Vec<&str> = lowered
        .split(|c: char| c == '/' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|part| !part.is_empty() && *part != "de" && *part != "of")
        .collect();
    let [first, second] = parts.as_slice() else {
        return None;
    };

    if first.len() == 4 && first.chars().all(|c| c.is_ascii_digit()) {
        let year = first.parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, month_number(second)?, 1)
    } else {
        NaiveDate::from_ymd_opt(expand_year(second)?, month_number(first)?, 1)
    }
}

const MONTH_PREFIXES: [(&str, u32); 19] = [
    ("jan", 1),
    ("fev", 2),
    ("feb", 2),
    ("mar", 3),
    ("abr", 4),
    ("apr", 4),
    ("mai", 5),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("aug", 8),
    ("set", 9),
    ("sep", 9),
    ("out", 10),
    ("oct", 10),
    ("nov", 11),
    ("dez", 12),
    ("dec", 12),
];

fn month_number(token: &str) -> Option<u32> {
    if let Ok(number) = token.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    if token.chars().count() < 3 {
        return None;
    }
    MONTH_PREFIXES
        .iter()
        .find(|(prefix, _)| token.starts_with(prefix))
        .map(|&(_, month)| month)
}

fn expand_year(raw: &str) -> Option<i32> {
    let year = raw.parse::<i32>().ok()?;
    match raw.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}
