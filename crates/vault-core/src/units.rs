//! Conversion between human-entered decimal strings and the fixed-point
//! integers the vault and its asset use on chain.

use std::fmt;

use alloy_primitives::{
    utils::{format_units, parse_units},
    U256,
};

use crate::{
    constants::BPS_DENOMINATOR,
    error::{CoreError, Result},
};

/// Parse a non-negative decimal amount into base units.
///
/// Input with more fractional digits than `decimals` is rejected rather than
/// rounded, so the submitted value always equals what the operator typed.
pub fn parse_amount(text: &str, decimals: u8) -> Result<U256> {
    let trimmed = text.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(CoreError::InvalidAmount(trimmed.to_string()));
    }

    if fraction.len() > decimals as usize {
        return Err(CoreError::TooManyDecimals {
            amount: trimmed.to_string(),
            decimals,
        });
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    parse_units(&normalized, decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|e| CoreError::AmountOverflow(format!("{trimmed}: {e}")))
}

/// Format base units as a decimal string without trailing fractional zeros.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let formatted = match format_units(value, decimals) {
        Ok(formatted) => formatted,
        Err(_) => return value.to_string(),
    };

    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Share of `whole` taken by `part`, in basis points. Zero when `whole` is zero.
pub fn share_bps(part: U256, whole: U256) -> u32 {
    if whole.is_zero() {
        return 0;
    }
    let bps = part.saturating_mul(U256::from(BPS_DENOMINATOR)) / whole;
    bps.min(U256::from(u32::MAX)).to::<u32>()
}

/// Render basis points as a percentage with one decimal, e.g. `33.3`.
pub fn format_bps(bps: u32) -> String {
    format!("{:.1}", bps as f64 / 100.0)
}

/// The vault's deposit cap. `U256::MAX` on chain means no cap.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DepositLimit {
    Limited(U256),
    Unlimited,
}

impl Default for DepositLimit {
    fn default() -> Self {
        DepositLimit::Limited(U256::ZERO)
    }
}

impl DepositLimit {
    pub fn from_raw(raw: U256) -> Self {
        if raw == U256::MAX {
            DepositLimit::Unlimited
        } else {
            DepositLimit::Limited(raw)
        }
    }

    /// Value to pass to `set_deposit_limit`.
    pub fn to_raw(self) -> U256 {
        match self {
            DepositLimit::Limited(limit) => limit,
            DepositLimit::Unlimited => U256::MAX,
        }
    }

    /// Accepts `unlimited` / `max` or a decimal amount in human units.
    pub fn parse(text: &str, decimals: u8) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("unlimited") || trimmed.eq_ignore_ascii_case("max") {
            return Ok(DepositLimit::Unlimited);
        }
        parse_amount(trimmed, decimals).map(Self::from_raw)
    }

    pub fn format(self, decimals: u8) -> String {
        match self {
            DepositLimit::Limited(limit) => format_amount(limit, decimals),
            DepositLimit::Unlimited => "unlimited".to_string(),
        }
    }

    /// Further deposits accepted given current total assets; `None` if uncapped.
    pub fn remaining(self, total_assets: U256) -> Option<U256> {
        match self {
            DepositLimit::Limited(limit) => Some(limit.saturating_sub(total_assets)),
            DepositLimit::Unlimited => None,
        }
    }
}

impl fmt::Display for DepositLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositLimit::Limited(limit) => write!(f, "{limit}"),
            DepositLimit::Unlimited => f.write_str("unlimited"),
        }
    }
}
