//! Decimal money helpers.
//!
//! Prices are stored as `NUMERIC` in the database and travel over the wire
//! as decimal strings ("1125.00"), never floats. These helpers centralize
//! the string round-trip so handlers and repositories format consistently.

use rust_decimal::Decimal;

/// Errors that can occur when parsing a money amount.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MoneyError {
    /// The input is not a valid decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
}

/// Format a decimal amount as a two-decimal-place string ("1125.00").
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Parse a non-negative decimal amount from its string form.
///
/// # Errors
///
/// Returns [`MoneyError::Invalid`] if the string is not a decimal number,
/// or [`MoneyError::Negative`] if it parses below zero.
pub fn parse_amount(s: &str) -> Result<Decimal, MoneyError> {
    let amount: Decimal = s
        .trim()
        .parse()
        .map_err(|_| MoneyError::Invalid(s.to_owned()))?;
    if amount < Decimal::ZERO {
        return Err(MoneyError::Negative);
    }
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_two_places() {
        assert_eq!(format_amount(d("1250")), "1250.00");
        assert_eq!(format_amount(d("125.5")), "125.50");
        assert_eq!(format_amount(d("0.005")), "0.01");
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_amount("500").unwrap(), d("500"));
        assert_eq!(parse_amount(" 12.34 ").unwrap(), d("12.34"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_amount("abc"), Err(MoneyError::Invalid(_))));
        assert!(matches!(parse_amount(""), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(matches!(parse_amount("-1"), Err(MoneyError::Negative)));
    }
}
