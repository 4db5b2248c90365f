//! Custom Askama template filters.

use std::fmt::Display;

/// Formats a decimal amount as a dollar price string.
///
/// Usage in templates: `{{ product.price|money }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn money(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&amount.to_string()))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Lowercases a status label into a CSS badge class suffix.
///
/// Unknown or empty labels fall back to `unknown` so the neutral badge
/// styling applies.
///
/// Usage in templates: `class="badge badge-{{ order.status|badge_class }}"`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn badge_class(status: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(status_class(&status.to_string()))
}

fn format_money(raw: &str) -> String {
    raw.parse::<f64>()
        .map_or_else(|_| format!("${raw}"), |value| format!("${value:.2}"))
}

fn status_class(label: &str) -> String {
    let class: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if class.is_empty() {
        "unknown".to_string()
    } else {
        class
    }
}
