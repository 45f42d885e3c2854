//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::{Datelike, NaiveDate};
use unicode_normalization::UnicodeNormalization;

use crate::{Currency, EngineError, Money, ResultEngine};

/// Trim a category name and collapse inner whitespace runs to one space.
pub(crate) fn normalize_category_display(value: &str) -> ResultEngine<String> {
    let display = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if display.is_empty() {
        return Err(EngineError::InvalidName(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(display)
}

/// Matching key for category names: NFKC, lowercase, collapsed whitespace.
///
/// `"  Food   &  Drink"` and `"food & drink"` share the key `"food & drink"`.
pub(crate) fn normalize_category_key(value: &str) -> ResultEngine<String> {
    let display = normalize_category_display(value)?;
    Ok(display.nfkc().collect::<String>().to_lowercase())
}

/// Trim optional free text; blank input becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidAmount(format!("invalid currency: {value}")))
}

/// Stored amounts (entries and budgets) lie in `0..=Money::MAX`.
pub(crate) fn ensure_amount(amount: Money) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(
            "amount must be >= 0".to_string(),
        ));
    }
    if !amount.is_storable() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be <= {}",
            Money::MAX
        )));
    }
    Ok(())
}

pub(crate) fn ensure_range(start: NaiveDate, end: NaiveDate) -> ResultEngine<()> {
    if start > end {
        return Err(EngineError::InvalidRange(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

/// First and last day of a calendar month.
pub(crate) fn month_bounds(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidDate(format!("invalid month {year}-{month:02}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let end = next.pred_opt().ok_or_else(invalid)?;
    Ok((start, end))
}

pub(crate) fn year_bounds(year: i32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidDate(format!("invalid year {year}"));
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
    Ok((start, end))
}

/// `YYYY-MM` label of a date.
pub(crate) fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
