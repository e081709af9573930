//! Discount code evaluation.
//!
//! Deciding whether a code is redeemable is deliberately side-effect free:
//! the standalone validation endpoint and the checkout transaction share
//! this function, and only checkout mutates `used_count` (with a
//! conditional increment, so passing validation here is never a
//! reservation).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crystal_atelier_core::DiscountType;

use crate::models::DiscountCode;

/// Why a code is not redeemable. Checks run in this order and
/// short-circuit on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiscountError {
    /// No code with that name exists.
    #[error("discount code not found")]
    NotFound,
    /// The code exists but is switched off.
    #[error("discount code is not active")]
    Inactive,
    /// The code's expiry has passed.
    #[error("discount code has expired")]
    Expired,
    /// The code's usage limit is exhausted.
    #[error("discount code usage limit reached")]
    LimitExceeded,
}

impl DiscountError {
    /// Stable wire discriminant for the JSON error body.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Inactive => "INVALID",
            Self::Expired => "EXPIRED",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
        }
    }
}

/// A successful evaluation: the computed discount and the code's public
/// metadata.
#[derive(Debug, Clone)]
pub struct DiscountEvaluation {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// The amount to subtract from the base. Never exceeds the base.
    pub amount: Decimal,
}

/// Evaluate a code against a base amount at a point in time.
///
/// PERCENTAGE computes `base * value / 100`; FIXED is capped at the base
/// so the net total can never go negative.
///
/// # Errors
///
/// The first failing check wins: [`DiscountError::Inactive`], then
/// [`DiscountError::Expired`], then [`DiscountError::LimitExceeded`].
/// ([`DiscountError::NotFound`] is produced by callers whose lookup missed.)
pub fn evaluate(
    code: &DiscountCode,
    base: Decimal,
    now: DateTime<Utc>,
) -> Result<DiscountEvaluation, DiscountError> {
    if !code.is_active {
        return Err(DiscountError::Inactive);
    }

    if let Some(expires_at) = code.expires_at
        && now > expires_at
    {
        return Err(DiscountError::Expired);
    }

    if let Some(limit) = code.usage_limit
        && code.used_count >= limit
    {
        return Err(DiscountError::LimitExceeded);
    }

    let amount = match code.discount_type {
        DiscountType::Percentage => {
            (base * code.discount_value / Decimal::from(100)).round_dp(2)
        }
        DiscountType::Fixed => code.discount_value.min(base),
    };

    Ok(DiscountEvaluation {
        code: code.code.clone(),
        discount_type: code.discount_type,
        discount_value: code.discount_value,
        amount,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crystal_atelier_core::DiscountCodeId;

    fn code(discount_type: DiscountType, value: &str) -> DiscountCode {
        DiscountCode {
            id: DiscountCodeId::new(1),
            code: "SAVE10".to_owned(),
            discount_type,
            discount_value: value.parse().unwrap(),
            is_active: true,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
            created_at: Utc::now(),
        }
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_percentage_of_base() {
        let eval = evaluate(&code(DiscountType::Percentage, "10"), d("1000"), Utc::now()).unwrap();
        assert_eq!(eval.amount, d("100.00"));
    }

    #[test]
    fn test_fixed_capped_at_base() {
        let eval = evaluate(&code(DiscountType::Fixed, "5000"), d("1000"), Utc::now()).unwrap();
        assert_eq!(eval.amount, d("1000"));

        let eval = evaluate(&code(DiscountType::Fixed, "50"), d("1000"), Utc::now()).unwrap();
        assert_eq!(eval.amount, d("50"));
    }

    #[test]
    fn test_inactive_rejected_first() {
        let mut c = code(DiscountType::Percentage, "10");
        c.is_active = false;
        // Inactive also expired: the activity check short-circuits first.
        c.expires_at = Some(Utc::now() - Duration::days(1));
        assert_eq!(
            evaluate(&c, d("100"), Utc::now()).unwrap_err(),
            DiscountError::Inactive
        );
    }

    #[test]
    fn test_expired_rejected() {
        let mut c = code(DiscountType::Percentage, "10");
        c.expires_at = Some(Utc::now() - Duration::hours(1));
        assert_eq!(
            evaluate(&c, d("100"), Utc::now()).unwrap_err(),
            DiscountError::Expired
        );
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let mut c = code(DiscountType::Percentage, "10");
        c.expires_at = Some(now);
        // now <= expires_at is still redeemable.
        assert!(evaluate(&c, d("100"), now).is_ok());
    }

    #[test]
    fn test_limit_reached_rejected_even_when_active() {
        let mut c = code(DiscountType::Percentage, "10");
        c.usage_limit = Some(1);
        c.used_count = 1;
        assert_eq!(
            evaluate(&c, d("100"), Utc::now()).unwrap_err(),
            DiscountError::LimitExceeded
        );
    }

    #[test]
    fn test_under_limit_accepted() {
        let mut c = code(DiscountType::Percentage, "10");
        c.usage_limit = Some(2);
        c.used_count = 1;
        assert!(evaluate(&c, d("100"), Utc::now()).is_ok());
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        let eval = evaluate(&code(DiscountType::Percentage, "15"), d("99.99"), Utc::now()).unwrap();
        assert_eq!(eval.amount, d("15.00"));
    }
}
