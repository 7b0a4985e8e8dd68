//! Money Conversion Module
//!
//! Unified conversion between the internal kobo representation and the
//! client-facing naira string representation. All conversions MUST go
//! through this module.
//!
//! ## Internal Representation
//! - All naira amounts are stored as `u64` kobo (`10^2` scale)
//! - Crypto asset quantities are carried as [`rust_decimal::Decimal`] and
//!   never enter balance arithmetic
//!
//! ## Usage
//! ```ignore
//! let kobo = parse_naira("2500.50")?;
//! assert_eq!(kobo, 250_050);
//! assert_eq!(format_kobo(250_050), "2500.50");
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Kobo per naira. The naira is the only fiat currency the desk settles in.
pub const KOBO_SCALE: u64 = 100;

/// Decimal places in the internal representation.
pub const NAIRA_DECIMALS: u32 = 2;

/// Money conversion errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Convert a client naira string to internal kobo.
///
/// Strict format rules: no sign, no empty side of the dot (`".5"` and `"5."`
/// are rejected), at most two fractional digits, and the result must be a
/// positive amount.
pub fn parse_naira(amount_str: &str) -> Result<u64, MoneyError> {
    let kobo = parse_naira_allow_zero(amount_str)?;
    if kobo == 0 {
        return Err(MoneyError::InvalidAmount);
    }
    Ok(kobo)
}

/// Same format rules as [`parse_naira`] but `"0"` / `"0.00"` parse to zero.
/// For fields where zero is a meaningful value, such as fees.
pub fn parse_naira_allow_zero(amount_str: &str) -> Result<u64, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple dots".into())),
    };

    if frac.len() as u32 > NAIRA_DECIMALS {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: NAIRA_DECIMALS,
        });
    }

    let whole_num: u64 = whole
        .parse()
        .map_err(|_| MoneyError::InvalidFormat(format!("bad whole part: {whole}")))?;

    // Pad fraction to exactly two digits before parsing
    let frac_num: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = NAIRA_DECIMALS as usize);
        padded
            .parse()
            .map_err(|_| MoneyError::InvalidFormat(format!("bad fractional part: {frac}")))?
    };

    whole_num
        .checked_mul(KOBO_SCALE)
        .and_then(|v| v.checked_add(frac_num))
        .ok_or(MoneyError::Overflow)
}

/// Format internal kobo as a naira string with two decimal places.
pub fn format_kobo(kobo: u64) -> String {
    format!("{}.{:02}", kobo / KOBO_SCALE, kobo % KOBO_SCALE)
}

/// Internal kobo as an exact [`Decimal`] naira value.
pub fn kobo_to_decimal(kobo: u64) -> Decimal {
    Decimal::new(kobo as i64, NAIRA_DECIMALS)
}
