//! Presentation helpers: currency/percentage formatting and the static
//! color/label lookups used by frontends.
//!
//! Nothing here is part of the computational contract. Colors and labels are
//! plain deterministic mappings, not hidden shared state.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{Instrument, StakeholderType};

/// Format a currency amount with a euro prefix and thousands separators.
/// Whole amounts drop the cents (`€2,000,000`); fractional amounts keep two
/// decimals (`€0.72`).
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let whole = abs.trunc();
    let cents = ((abs - whole) * dec!(100)).round().to_u32().unwrap_or(0);

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('€');
    out.push_str(&group_thousands(&whole.normalize().to_string()));
    if cents != 0 {
        out.push_str(&format!(".{cents:02}"));
    }
    out
}

/// Format a percentage value with one decimal place (`20.0%`).
pub fn format_percentage(value: Decimal) -> String {
    format!("{:.1}%", value)
}

/// Parse a percentage string produced by [`format_percentage`] (or plain user
/// input with an optional `%` suffix).
pub fn parse_percentage(text: &str) -> Option<Decimal> {
    text.trim().trim_end_matches('%').trim().parse().ok()
}

/// Format a raw share count with thousands separators.
pub fn format_shares(shares: u64) -> String {
    group_thousands(&shares.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

const OTHER_PALETTE: [&str; 5] = ["#0ea5e9", "#ec4899", "#14b8a6", "#a855f7", "#f97316"];

/// Deterministic display color for a stakeholder row.
///
/// Fixed per type; `Other` cycles a small fallback palette by row index so
/// adjacent uncategorized rows stay distinguishable.
pub fn stakeholder_color(stakeholder_type: StakeholderType, index: usize) -> &'static str {
    match stakeholder_type {
        StakeholderType::Founder => "#6366f1",
        StakeholderType::Employee => "#22c55e",
        StakeholderType::Investor => "#f59e0b",
        StakeholderType::Esop => "#94a3b8",
        StakeholderType::Other => OTHER_PALETTE[index % OTHER_PALETTE.len()],
    }
}

/// Human-readable label for an instrument.
pub fn instrument_label(instrument: &Instrument) -> &'static str {
    match instrument {
        Instrument::Equity { .. } => "Priced equity round",
        Instrument::Safe { .. } => "SAFE (converts at next priced round)",
        Instrument::ConvertibleNote { .. } => "Convertible note (converts at next priced round)",
    }
}

/// Static (wire tag, label) listing for help and legend output.
pub fn instrument_labels() -> [(&'static str, &'static str); 3] {
    [
        ("equity", "Priced equity round"),
        ("safe", "SAFE (converts at next priced round)"),
        ("convertible_note", "Convertible note (converts at next priced round)"),
    ]
}
