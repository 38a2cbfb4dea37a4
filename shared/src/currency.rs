//! Currency display formatting
//!
//! Display strings only. Stored amounts are always plain `Decimal`s.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Display conventions for one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencySpec {
    pub code: &'static str,
    pub symbol: &'static str,
    pub decimals: u32,
    pub symbol_after: bool,
    pub group_separator: char,
    pub decimal_separator: char,
}

const fn spec(
    code: &'static str,
    symbol: &'static str,
    decimals: u32,
    symbol_after: bool,
    group_separator: char,
    decimal_separator: char,
) -> CurrencySpec {
    CurrencySpec {
        code,
        symbol,
        decimals,
        symbol_after,
        group_separator,
        decimal_separator,
    }
}

pub const SUPPORTED_CURRENCIES: &[CurrencySpec] = &[
    spec("USD", "$", 2, false, ',', '.'),
    spec("CAD", "CA$", 2, false, ',', '.'),
    spec("AUD", "A$", 2, false, ',', '.'),
    spec("GBP", "£", 2, false, ',', '.'),
    spec("EUR", "€", 2, true, '.', ','),
    spec("CHF", "CHF", 2, false, '\'', '.'),
    spec("THB", "฿", 2, false, ',', '.'),
    spec("INR", "₹", 2, false, ',', '.'),
    spec("PHP", "₱", 2, false, ',', '.'),
    spec("MXN", "MX$", 2, false, ',', '.'),
    spec("BRL", "R$", 2, false, '.', ','),
    spec("JPY", "¥", 0, false, ',', '.'),
    spec("KRW", "₩", 0, false, ',', '.'),
    spec("VND", "₫", 0, true, '.', ','),
];

/// Fallback used for codes not in the table
const DEFAULT_DECIMALS: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("empty amount")]
    Empty,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Look up display conventions by ISO code (case-insensitive)
pub fn lookup(code: &str) -> Option<&'static CurrencySpec> {
    SUPPORTED_CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Format `amount` for display in `currency_code`.
///
/// Unknown codes are rendered as `"XYZ 1,234.50"`.
pub fn format(amount: Decimal, currency_code: &str) -> String {
    match lookup(currency_code) {
        Some(spec) => format_with(amount, spec),
        None => {
            let number = group_number(amount.abs(), DEFAULT_DECIMALS, ',', '.');
            let sign = if is_negative_display(amount, DEFAULT_DECIMALS) { "-" } else { "" };
            format!("{}{} {}", sign, currency_code.trim().to_ascii_uppercase(), number)
        }
    }
}

/// Format using explicit conventions
pub fn format_with(amount: Decimal, spec: &CurrencySpec) -> String {
    let number = group_number(
        amount.abs(),
        spec.decimals,
        spec.group_separator,
        spec.decimal_separator,
    );
    let sign = if is_negative_display(amount, spec.decimals) { "-" } else { "" };

    if spec.symbol_after {
        format!("{}{} {}", sign, number, spec.symbol)
    } else {
        format!("{}{}{}", sign, spec.symbol, number)
    }
}

/// Parse a display string in the conventions of `currency_code`.
pub fn parse_in(display: &str, currency_code: &str) -> Result<Decimal, CurrencyError> {
    let decimal = lookup(currency_code)
        .map(|s| s.decimal_separator)
        .unwrap_or('.');
    let cleaned = strip_to_number(display, |c| c == decimal);
    to_decimal(&cleaned, display)
}

/// Parse a display string without knowing its currency.
///
/// When both `.` and `,` appear, the last one is the decimal separator. A
/// single separator followed by exactly three digits is read as grouping.
pub fn parse(display: &str) -> Result<Decimal, CurrencyError> {
    let separators: Vec<(usize, char)> = display
        .char_indices()
        .filter(|(_, c)| *c == '.' || *c == ',')
        .collect();

    let decimal = match separators.last() {
        None => None,
        Some(&(idx, last)) => {
            let mixed = separators.iter().any(|(_, c)| *c != last);
            let repeated = separators.iter().filter(|(_, c)| *c == last).count() > 1;
            let digits_after = display[idx + 1..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if mixed || (!repeated && digits_after != 3) {
                Some(last)
            } else {
                None
            }
        }
    };

    let cleaned = match decimal {
        Some(d) => strip_to_number(display, |c| c == d),
        None => strip_to_number(display, |_| false),
    };
    to_decimal(&cleaned, display)
}

fn is_negative_display(amount: Decimal, decimals: u32) -> bool {
    amount.is_sign_negative() && !round_to(amount, decimals).is_zero()
}

fn round_to(amount: Decimal, decimals: u32) -> Decimal {
    amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

fn group_number(amount: Decimal, decimals: u32, group: char, decimal: char) -> String {
    let mut rounded = round_to(amount, decimals);
    rounded.rescale(decimals);
    let text = rounded.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(group);
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(frac) => format!("{}{}{}", grouped, decimal, frac),
        None => grouped,
    }
}

/// Keep digits and sign, map the decimal separator to '.', drop grouping,
/// symbols and whitespace.
fn strip_to_number(display: &str, is_decimal: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(display.len());
    for c in display.chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '-' || c == '(' {
            if !out.starts_with('-') {
                out.insert(0, '-');
            }
        } else if is_decimal(c) {
            out.push('.');
        }
    }
    out
}

fn to_decimal(cleaned: &str, original: &str) -> Result<Decimal, CurrencyError> {
    if cleaned.trim_start_matches('-').is_empty() {
        return if original.trim().is_empty() {
            Err(CurrencyError::Empty)
        } else {
            Err(CurrencyError::InvalidAmount(original.to_string()))
        };
    }
    Decimal::from_str(cleaned).map_err(|_| CurrencyError::InvalidAmount(original.to_string()))
}
