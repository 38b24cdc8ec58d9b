//! Slippage Policy
//!
//! Manual tolerance, "protected" auto mode and minimum-output derivation.
//!
//! Protected mode can only tighten the user's tolerance:
//! effective = min(smart, manual).

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};

// ============================================
// CONSTANTS
// ============================================

pub const DEFAULT_SLIPPAGE: f64 = 0.5;
pub const MIN_SLIPPAGE: f64 = 0.01;
pub const MAX_SLIPPAGE: f64 = 50.0;

/// Above this a swap is an easy MEV target
const HIGH_RISK_SLIPPAGE: f64 = 5.0;
const ELEVATED_SLIPPAGE: f64 = 2.0;

/// Pairs of these settle on a 0.1% tolerance in protected mode
pub const STABLECOINS: [&str; 4] = ["USDC", "USDT", "DAI", "BUSD"];

const BPS_DENOMINATOR: u64 = 10_000;

/// A selectable slippage preset
#[derive(Debug, Clone, Copy)]
pub struct SlippagePreset {
    pub label: &'static str,
    pub value: f64,
    pub description: &'static str,
}

pub const SLIPPAGE_PRESETS: [SlippagePreset; 4] = [
    SlippagePreset { label: "0.1%", value: 0.1, description: "Very conservative (stablecoins)" },
    SlippagePreset { label: "0.5%", value: 0.5, description: "Conservative (recommended)" },
    SlippagePreset { label: "1%", value: 1.0, description: "Standard" },
    SlippagePreset { label: "3%", value: 3.0, description: "High risk" },
];

// ============================================
// VALIDATION
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageWarning {
    InvalidValue,
    BelowMinimum,
    AboveMaximum,
    /// > 5%
    HighRisk,
    /// > 2%
    Elevated,
}

impl std::fmt::Display for SlippageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlippageWarning::InvalidValue => write!(f, "Invalid value"),
            SlippageWarning::BelowMinimum => write!(f, "Minimum slippage: {}%", MIN_SLIPPAGE),
            SlippageWarning::AboveMaximum => write!(f, "Maximum slippage: {}%", MAX_SLIPPAGE),
            SlippageWarning::HighRisk => write!(f, "⚠️ High slippage - risk of MEV losses"),
            SlippageWarning::Elevated => write!(f, "⚠️ Elevated slippage - consider reducing"),
        }
    }
}

/// Outcome of validating a slippage value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippageCheck {
    pub valid: bool,
    pub warning: Option<SlippageWarning>,
}

impl SlippageCheck {
    fn ok() -> Self {
        Self { valid: true, warning: None }
    }

    fn warn(warning: SlippageWarning) -> Self {
        Self { valid: true, warning: Some(warning) }
    }

    fn reject(warning: SlippageWarning) -> Self {
        Self { valid: false, warning: Some(warning) }
    }
}

pub fn validate_slippage(slippage: f64) -> SlippageCheck {
    if slippage.is_nan() || slippage < 0.0 {
        return SlippageCheck::reject(SlippageWarning::InvalidValue);
    }
    if slippage < MIN_SLIPPAGE {
        return SlippageCheck::reject(SlippageWarning::BelowMinimum);
    }
    if slippage > MAX_SLIPPAGE {
        return SlippageCheck::reject(SlippageWarning::AboveMaximum);
    }
    if slippage > HIGH_RISK_SLIPPAGE {
        return SlippageCheck::warn(SlippageWarning::HighRisk);
    }
    if slippage > ELEVATED_SLIPPAGE {
        return SlippageCheck::warn(SlippageWarning::Elevated);
    }
    SlippageCheck::ok()
}

/// Parse user input ("0.5", "0.5%") and validate it
pub fn parse_slippage(input: &str) -> (Option<f64>, SlippageCheck) {
    let trimmed = input.trim().trim_end_matches('%').trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => (Some(value), validate_slippage(value)),
        _ => (None, SlippageCheck::reject(SlippageWarning::InvalidValue)),
    }
}

/// Range check used by swap construction
pub fn ensure_in_range(slippage: f64) -> DexResult<()> {
    if slippage.is_nan() || slippage < MIN_SLIPPAGE || slippage > MAX_SLIPPAGE {
        return Err(DexError::InvalidSlippage(slippage));
    }
    Ok(())
}

// ============================================
// POLICY
// ============================================

pub fn is_stable_pair(from_symbol: &str, to_symbol: &str) -> bool {
    STABLECOINS.contains(&from_symbol) && STABLECOINS.contains(&to_symbol)
}

/// Heuristic tolerance from pair type and swap size (reference units)
pub fn smart_slippage(from_symbol: &str, to_symbol: &str, swap_size: f64) -> f64 {
    if is_stable_pair(from_symbol, to_symbol) {
        return 0.1;
    }

    if swap_size < 100.0 {
        0.3
    } else if swap_size < 1_000.0 {
        0.5
    } else if swap_size < 10_000.0 {
        0.8
    } else {
        1.2
    }
}

/// Slippage as whole basis points, rounded at 2 decimals of a percent
pub fn slippage_bps(slippage_percent: f64) -> u64 {
    let bps = (slippage_percent * 100.0).round();
    if bps.is_nan() || bps <= 0.0 {
        0
    } else {
        (bps as u64).min(BPS_DENOMINATOR)
    }
}

/// expected × (100 − slippage) / 100 in integer arithmetic
///
/// Split into quotient and remainder so the product never overflows U256.
pub fn minimum_output(expected_output: U256, slippage_percent: f64) -> U256 {
    let multiplier = U256::from(BPS_DENOMINATOR - slippage_bps(slippage_percent));
    let denominator = U256::from(BPS_DENOMINATOR);

    let whole = expected_output / denominator;
    let rest = expected_output % denominator;
    whole * multiplier + rest * multiplier / denominator
}

/// Persisted slippage preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlippageSettings {
    pub slippage: f64,
    pub protected_mode: bool,
}

impl Default for SlippageSettings {
    fn default() -> Self {
        Self {
            slippage: DEFAULT_SLIPPAGE,
            protected_mode: false,
        }
    }
}

impl SlippageSettings {
    /// Change the manual tolerance; invalid values leave settings untouched
    pub fn set_slippage(&mut self, slippage: f64) -> DexResult<SlippageCheck> {
        let check = validate_slippage(slippage);
        if !check.valid {
            return Err(DexError::InvalidSlippage(slippage));
        }
        self.slippage = slippage;
        Ok(check)
    }

    pub fn set_protected_mode(&mut self, enabled: bool) {
        self.protected_mode = enabled;
    }

    /// Tolerance to use for a given swap
    pub fn effective(&self, from_symbol: &str, to_symbol: &str, swap_size: f64) -> f64 {
        if self.protected_mode {
            smart_slippage(from_symbol, to_symbol, swap_size).min(self.slippage)
        } else {
            self.slippage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ranges() {
        for value in [0.01, 0.1, 0.5, 1.0, 2.0] {
            assert_eq!(validate_slippage(value), SlippageCheck::ok(), "{}", value);
        }
        assert!(!validate_slippage(0.009).valid);
        assert!(!validate_slippage(50.01).valid);
        assert!(!validate_slippage(-1.0).valid);
        assert!(!validate_slippage(f64::NAN).valid);
        assert_eq!(validate_slippage(50.0).warning, Some(SlippageWarning::HighRisk));
        assert!(validate_slippage(50.0).valid);
    }

    #[test]
    fn test_validate_warnings() {
        assert_eq!(validate_slippage(5.5), SlippageCheck::warn(SlippageWarning::HighRisk));
        assert_eq!(validate_slippage(5.0), SlippageCheck::warn(SlippageWarning::Elevated));
        assert_eq!(validate_slippage(2.5), SlippageCheck::warn(SlippageWarning::Elevated));
        assert_eq!(validate_slippage(0.001).warning, Some(SlippageWarning::BelowMinimum));
        assert_eq!(validate_slippage(60.0).warning, Some(SlippageWarning::AboveMaximum));
    }

    #[test]
    fn test_parse_slippage() {
        assert_eq!(parse_slippage("0.5%").0, Some(0.5));
        assert!(parse_slippage(" 1 ").1.valid);
        let (value, check) = parse_slippage("abc");
        assert!(value.is_none());
        assert_eq!(check.warning, Some(SlippageWarning::InvalidValue));
    }

    #[test]
    fn test_smart_slippage() {
        // Stable pair ignores size
        assert_eq!(smart_slippage("USDC", "USDT", 50.0), 0.1);
        assert_eq!(smart_slippage("USDC", "USDT", 1_000_000.0), 0.1);

        assert_eq!(smart_slippage("WETH", "USDC", 50.0), 0.3);
        assert_eq!(smart_slippage("WETH", "USDC", 500.0), 0.5);
        assert_eq!(smart_slippage("WETH", "USDC", 5_000.0), 0.8);
        assert_eq!(smart_slippage("WETH", "USDC", 50_000.0), 1.2);
    }

    #[test]
    fn test_protected_mode_only_tightens() {
        let mut settings = SlippageSettings { slippage: 0.2, protected_mode: true };
        assert_eq!(settings.effective("WETH", "WBTC", 50_000.0), 0.2);
        assert_eq!(settings.effective("USDC", "DAI", 10.0), 0.1);

        settings.set_slippage(3.0).unwrap();
        assert_eq!(settings.effective("WETH", "WBTC", 50_000.0), 1.2);

        settings.set_protected_mode(false);
        assert_eq!(settings.effective("WETH", "WBTC", 50_000.0), 3.0);
    }

    #[test]
    fn test_set_invalid_slippage_keeps_previous() {
        let mut settings = SlippageSettings::default();
        assert!(settings.set_slippage(51.0).is_err());
        assert!(settings.set_slippage(0.0).is_err());
        assert_eq!(settings.slippage, DEFAULT_SLIPPAGE);
    }

    #[test]
    fn test_minimum_output() {
        let expected = U256::from(1_000_000u64);
        assert_eq!(minimum_output(expected, 0.5), U256::from(995_000u64));
        assert_eq!(minimum_output(expected, 0.01), U256::from(999_900u64));
        assert_eq!(minimum_output(expected, 50.0), U256::from(500_000u64));
        assert_eq!(minimum_output(U256::ZERO, 0.5), U256::ZERO);
        assert_eq!(minimum_output(U256::from(12_345u64), 0.5), U256::from(12_283u64));
    }

    #[test]
    fn test_minimum_output_near_u256_max() {
        let max = U256::MAX;
        let min = minimum_output(max, 0.5);
        assert!(min < max);
        // floor(MAX * 9950 / 10000), computed without overflow
        let expected = max / U256::from(10_000u64) * U256::from(9_950u64)
            + (max % U256::from(10_000u64)) * U256::from(9_950u64) / U256::from(10_000u64);
        assert_eq!(min, expected);
        assert_eq!(minimum_output(max, 50.0), max / U256::from(2u64));
    }

    #[test]
    fn test_minimum_output_strictly_below_expected() {
        let expected_values = [1u64, 7, 999, 10_001, 123_456_789, u64::MAX];
        let slippages = [0.01, 0.1, 0.3, 0.5, 1.2, 2.0, 5.0, 49.99, 50.0];

        for e in expected_values {
            for s in slippages {
                let expected = U256::from(e);
                assert!(minimum_output(expected, s) < expected, "E={} S={}", e, s);
            }
        }
    }

    #[test]
    fn test_bps_rounding() {
        assert_eq!(slippage_bps(0.3), 30);
        assert_eq!(slippage_bps(0.01), 1);
        assert_eq!(slippage_bps(1.2), 120);
        assert_eq!(slippage_bps(0.0), 0);
        assert_eq!(slippage_bps(150.0), 10_000);
    }

    #[test]
    fn test_settings_json_shape() {
        let json = serde_json::to_string(&SlippageSettings::default()).unwrap();
        assert_eq!(json, r#"{"slippage":0.5,"protectedMode":false}"#);
    }
}
