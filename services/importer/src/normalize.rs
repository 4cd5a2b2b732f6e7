//! Lenient coercion of raw extract strings into typed values.
//!
//! Nothing here fails: a value that cannot be read becomes `None` and the
//! rest of the row is unaffected.

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{CompanyRecord, MergedRow};

/// Currency assumed when the capital extract gives an amount without one.
pub const DEFAULT_CURRENCY: &str = "EUR";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
];

/// True when the text carries a four-digit year: a leading or trailing digit
/// run of length 4, or a bare `YYYYMMDD`. chrono's `%Y` alone would read
/// `1.2.3` as year 1.
fn has_four_digit_year(text: &str) -> bool {
    let runs: Vec<&str> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();
    match runs.as_slice() {
        [single] => single.len() == 8,
        [first, .., last] => first.len() == 4 || last.len() == 4,
        [] => false,
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    // Checks the date part only so a time of day cannot supply the year.
    let date_part = value.split(|c: char| c == ' ' || c == 'T').next()?;
    if !has_four_digit_year(date_part) {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(datetime.date());
    }

    // Timestamps with zone offsets or odd time parts: keep the date part.
    if date_part.len() < value.len() {
        return DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok());
    }

    None
}

/// Integer codes; `"310.0"` is accepted as 310.
pub fn parse_int(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    if !value.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+')) {
        return None;
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

/// Decimal amounts written with either `,` or `.` as the fractional
/// separator. When both appear, the last one is fractional and the other
/// groups thousands. Spaces (including NBSP) group thousands.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    // Plain digits and separators only: no exponents, no inf/NaN.
    if compact.is_empty()
        || !compact
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '+'))
    {
        return None;
    }

    let cleaned = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Upper-cased currency, defaulting when an amount exists without one.
pub fn normalize_currency(currency: Option<&str>, amount: Option<f64>) -> Option<String> {
    if amount.is_none() {
        return None;
    }
    match currency.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(code.to_uppercase()),
        None => Some(DEFAULT_CURRENCY.to_string()),
    }
}

/// Types a merged row. The caller guarantees `jar.name` is present.
pub fn normalize_row(row: MergedRow) -> CompanyRecord {
    let MergedRow { jar, pvm, capital } = row;

    let (pvm_code, pvm_date) = match pvm {
        Some(pvm) => (pvm.pvm_code, pvm.pvm_date.as_deref().and_then(parse_date)),
        None => (None, None),
    };

    let (authorized_capital, capital_currency) = match capital {
        Some(capital) => {
            let amount = capital.amount.as_deref().and_then(parse_decimal);
            let currency = normalize_currency(capital.currency.as_deref(), amount);
            (amount, currency)
        }
        None => (None, None),
    };

    CompanyRecord {
        code: jar.code,
        name: jar.name.unwrap_or_default(),
        address: jar.address,
        registration_date: jar.registration_date.as_deref().and_then(parse_date),
        legal_form_code: jar.legal_form_code.as_deref().and_then(parse_int),
        legal_form_name: jar.legal_form_name,
        status_code: jar.status_code.as_deref().and_then(parse_int),
        status_name: jar.status_name,
        status_date_from: jar.status_date_from.as_deref().and_then(parse_date),
        data_updated_at: jar.data_updated_at.as_deref().and_then(parse_date),
        pvm_code,
        pvm_date,
        authorized_capital,
        capital_currency,
    }
}

pub fn normalize_rows(rows: Vec<MergedRow>) -> Vec<CompanyRecord> {
    rows.into_iter().map(normalize_row).collect()
}
