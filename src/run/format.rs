use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::Transaction;

/// Dollar amount with thousands separators, e.g. `-1234567.891` → `"-$1,234,567.89"`.
///
/// Rounds to cents first with banker's rounding (`1.005` → `$1.00`), so a
/// value that rounds to zero prints without a sign.
pub(crate) fn format_amount(val: Decimal) -> String {
    let cents = val.round_dp(2);
    let digits = format!("{:.2}", cents.abs());
    let (whole, frac) = digits.split_at(digits.len().saturating_sub(3));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if cents < Decimal::ZERO { "-" } else { "" };
    format!("{sign}${grouped}{frac}")
}

/// `+$12.00` for income, `-$12.00` for expense.
pub(crate) fn format_entry(txn: &Transaction) -> String {
    let signed = format_amount(txn.signed_amount());
    if txn.is_income() {
        format!("+{signed}")
    } else {
        signed
    }
}

pub(crate) fn format_percent(val: Decimal) -> String {
    format!("{:.1}%", val.round_dp(1))
}

/// Text progress bar, `width` cells wide, filled to `fill` percent (0-100).
pub(crate) fn progress_bar(fill: Decimal, width: usize) -> String {
    let clamped = fill.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(width) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Fit `s` into a column of `max` characters, marking a cut with "…".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.char_indices().nth(max).is_none() {
        return s.to_string();
    }
    let Some(last) = max.checked_sub(1) else {
        return String::new();
    };
    let cut = s.char_indices().nth(last).map_or(s.len(), |(i, _)| i);
    format!("{}…", &s[..cut])
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod format_tests;
