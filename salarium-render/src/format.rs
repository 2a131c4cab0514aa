//! Display formatting shared by both renderers
//!
//! Formatting only: figures arrive fully computed on the `Report`.

use num_format::{Locale, ToFormattedString};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::money::{Precision, round_dp, to_number};

/// `$1,234.56`, negative as `-$1,234.56`
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_dp(value, 2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let integer = abs.trunc();
    let cents = ((abs - integer) * Decimal::ONE_HUNDRED).trunc();

    let integer_part = integer
        .to_u64()
        .map(|v| v.to_formatted_string(&Locale::en))
        .unwrap_or_else(|| integer.to_string());
    let cents = cents.to_u64().unwrap_or(0);

    format!(
        "{}${}.{:02}",
        if negative { "-" } else { "" },
        integer_part,
        cents
    )
}

/// Percentage value (already ×100) with one decimal, e.g. `23.3%`
pub fn format_percent(pct: Decimal) -> String {
    format!("{:.1}%", round_dp(pct, 1))
}

/// Percentage as the fraction stored in spreadsheet cells (32.8% → 0.328)
pub fn percent_fraction(pct: Decimal) -> f64 {
    to_number(pct / Decimal::ONE_HUNDRED, Precision::Full)
}

/// Thousands-separated integer, e.g. `1,204`
pub fn format_count(count: usize) -> String {
    count.to_formatted_string(&Locale::en)
}
