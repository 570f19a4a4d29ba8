//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a price as dollars with two decimals.
///
/// Usage in templates: `{{ shoe.price|dollars }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn dollars(price: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("${price}"))
}
