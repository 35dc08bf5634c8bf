//! Display formatting for prices, market caps and percentages.
//!
//! USD follows the en-US locale (`$1,234.56`), IDR follows id-ID
//! (`Rp 1.234.567`, no fraction digits). Values are for display only.

use crate::types::Currency;

const TRILLION: f64 = 1e12;
const BILLION: f64 = 1e9;
const MILLION: f64 = 1e6;

struct Locale {
    symbol: &'static str,
    // id-ID puts a no-break space between the symbol and the amount
    separator: &'static str,
    group: char,
    decimal: char,
    fraction_digits: usize,
}

fn locale_for(currency: Currency) -> Locale {
    match currency {
        Currency::Usd => Locale {
            symbol: "$",
            separator: "",
            group: ',',
            decimal: '.',
            fraction_digits: 2,
        },
        Currency::Idr => Locale {
            symbol: "Rp",
            separator: "\u{a0}",
            group: '.',
            decimal: ',',
            fraction_digits: 0,
        },
    }
}

/// Symbol used by the abbreviated (T/B/M) form.
pub fn currency_symbol(currency: Currency) -> &'static str {
    locale_for(currency).symbol
}

fn group_digits(digits: &str, group: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(group);
        }
        grouped.push(ch);
    }
    grouped
}

fn format_with_digits(value: f64, currency: Currency, fraction_digits: usize) -> String {
    let locale = locale_for(currency);
    let fixed = format!("{:.1$}", value.abs(), fraction_digits);
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    // -0.00 after rounding is shown unsigned
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(locale.symbol);
    out.push_str(locale.separator);
    out.push_str(&group_digits(integer, locale.group));
    if let Some(fraction) = fraction {
        out.push(locale.decimal);
        out.push_str(fraction);
    }
    out
}

/// Full currency format with locale grouping: 2 fraction digits for USD,
/// none for IDR.
pub fn format_currency(value: f64, currency: Currency) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    format_with_digits(value, currency, locale_for(currency).fraction_digits)
}

/// Currency without fraction digits, used for chart axis ticks.
pub fn format_currency_whole(value: f64, currency: Currency) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    format_with_digits(value, currency, 0)
}

/// Abbreviates values of a million and above with T/B/M suffixes; smaller
/// values fall back to [`format_currency`].
pub fn format_large_number(value: f64, currency: Currency) -> String {
    let symbol = currency_symbol(currency);

    if value >= TRILLION {
        format!("{}{:.2}T", symbol, value / TRILLION)
    } else if value >= BILLION {
        format!("{}{:.2}B", symbol, value / BILLION)
    } else if value >= MILLION {
        format!("{}{:.2}M", symbol, value / MILLION)
    } else {
        format_currency(value, currency)
    }
}

/// Signed percentage with two decimals; missing values render as `N/A`.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            // -0.0 passes `>= 0.0` but prints as "-0.00"
            let v = if v == 0.0 { 0.0 } else { v };
            let sign = if v >= 0.0 { "+" } else { "" };
            format!("{}{:.2}%", sign, v)
        }
        _ => "N/A".to_string(),
    }
}

/// Plain grouped number without a currency symbol, used for supplies.
pub fn format_supply(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let fixed = format!("{:.0}", v.abs());
            let grouped = group_digits(&fixed, ',');
            if v < 0.0 {
                format!("-{}", grouped)
            } else {
                grouped
            }
        }
        _ => "N/A".to_string(),
    }
}
