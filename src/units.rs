//! Token amount parsing and display helpers

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;

use crate::error::{DexError, DexResult};

/// Accepts the same shapes as the amount input field: digits with at most one dot
pub fn is_amount_input(value: &str) -> bool {
    let mut seen_dot = false;
    value.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_dot => {
            seen_dot = true;
            true
        }
        _ => false,
    })
}

/// Convert a human-readable amount ("1.5") into base units
pub fn parse_token_amount(value: &str, decimals: u8) -> DexResult<U256> {
    let value = value.trim();
    if value.is_empty() || value == "." || !is_amount_input(value) {
        return Err(DexError::InvalidAmount(value.to_string()));
    }

    // "1." and ".5" are accepted by the input filter
    let normalized = match (value.starts_with('.'), value.ends_with('.')) {
        (true, _) => format!("0{}", value),
        (_, true) => value.trim_end_matches('.').to_string(),
        _ => value.to_string(),
    };

    parse_units(&normalized, decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|e| DexError::InvalidAmount(format!("{}: {}", value, e)))
}

/// Base units back to a trimmed decimal string
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
    match format_units(amount, decimals) {
        Ok(s) if s.contains('.') => {
            let trimmed = s.trim_end_matches('0').trim_end_matches('.');
            trimmed.to_string()
        }
        Ok(s) => s,
        Err(_) => amount.to_string(),
    }
}

/// Base units as a float in whole tokens (display / heuristics only)
pub fn to_token_units_f64(amount: U256, decimals: u8) -> f64 {
    format_token_amount(amount, decimals).parse().unwrap_or(0.0)
}

/// Display formatting for prices and balances
pub fn format_number(value: f64, max_decimals: usize) -> String {
    if value.is_nan() || value == 0.0 {
        return "0".to_string();
    }

    if value > 0.0 && value < 0.000001 {
        return format!("{:.2e}", value);
    }

    if value >= 1_000_000.0 {
        return with_thousands_separators(value);
    }

    let formatted = format!("{:.*}", max_decimals, value);
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

fn with_thousands_separators(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_input_filter() {
        assert!(is_amount_input("1.5"));
        assert!(is_amount_input(".5"));
        assert!(is_amount_input(""));
        assert!(!is_amount_input("1.2.3"));
        assert!(!is_amount_input("-1"));
        assert!(!is_amount_input("1e5"));
    }

    #[test]
    fn test_parse_token_amount() {
        assert_eq!(parse_token_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_token_amount(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_token_amount("2.", 8).unwrap(), U256::from(200_000_000u64));
        assert_eq!(
            parse_token_amount("1", 18).unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert!(parse_token_amount("", 18).is_err());
        assert!(parse_token_amount("-3", 18).is_err());
        assert!(parse_token_amount("abc", 18).is_err());
    }

    #[test]
    fn test_format_token_amount() {
        assert_eq!(format_token_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_token_amount(U256::from(3_000_000u64), 6), "3");
        assert_eq!(format_token_amount(U256::ZERO, 18), "0");
        assert_eq!(to_token_units_f64(U256::from(250_000u64), 6), 0.25);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0, 6), "0");
        assert_eq!(format_number(1.23456789, 6), "1.234568");
        assert_eq!(format_number(2.5, 6), "2.5");
        assert_eq!(format_number(0.0000001, 6), "1.00e-7");
        assert_eq!(format_number(1_234_567.891, 6), "1,234,567.89");
        assert_eq!(format_number(3_000_000.0, 6), "3,000,000");
    }
}
