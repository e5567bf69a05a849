//! Promo code evaluation tests
//!
//! Tests for promo code logic including:
//! - Discount computation for percentage and fixed codes
//! - Rejection ordering: expiry, minimum amount, usage limit
//! - Code normalization

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn percentage_discount(value: Decimal, amount: Decimal) -> Decimal {
    amount * value / dec("100")
}

#[derive(Debug, PartialEq)]
enum PromoRejection {
    Expired,
    BelowMinimum,
    UsageLimitReached,
}

/// Mirrors the evaluation order: expiry first, then minimum amount,
/// then remaining uses.
fn evaluate(
    expired: bool,
    min_amount: Decimal,
    amount: Decimal,
    max_uses: Option<i32>,
    used_count: i32,
) -> Result<(), PromoRejection> {
    if expired {
        return Err(PromoRejection::Expired);
    }
    if amount < min_amount {
        return Err(PromoRejection::BelowMinimum);
    }
    if let Some(max) = max_uses {
        if used_count >= max {
            return Err(PromoRejection::UsageLimitReached);
        }
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Ten percent off a 2000 cart
    #[test]
    fn test_percentage_discount() {
        let discount = percentage_discount(dec("10"), dec("2000"));
        assert_eq!(discount, dec("200"));

        let final_amount = dec("2000") - discount;
        assert_eq!(final_amount, dec("1800"));
    }

    /// Fixed discount is the code's value regardless of cart size
    #[test]
    fn test_fixed_discount() {
        let value = dec("500");
        let discount = value;

        assert_eq!(dec("2000") - discount, dec("1500"));
        assert_eq!(dec("600") - discount, dec("100"));
    }

    /// A fixed discount larger than the cart clamps the total at zero
    #[test]
    fn test_discount_clamps_at_zero() {
        let amount = dec("300");
        let discount = dec("500");
        let final_amount = (amount - discount).max(Decimal::ZERO);

        assert_eq!(final_amount, Decimal::ZERO);
    }

    /// Cart below the code's minimum is rejected
    #[test]
    fn test_below_minimum_rejected() {
        let result = evaluate(false, dec("1000"), dec("500"), None, 0);
        assert_eq!(result, Err(PromoRejection::BelowMinimum));
    }

    /// Cart exactly at the minimum is accepted
    #[test]
    fn test_minimum_boundary_accepted() {
        let result = evaluate(false, dec("1000"), dec("1000"), None, 0);
        assert!(result.is_ok());
    }

    /// Expired codes are rejected before any other check
    #[test]
    fn test_expired_takes_priority() {
        // Also below minimum and over the usage limit, but expiry wins
        let result = evaluate(true, dec("1000"), dec("500"), Some(5), 5);
        assert_eq!(result, Err(PromoRejection::Expired));
    }

    /// A used-up code is rejected
    #[test]
    fn test_usage_limit_reached() {
        let result = evaluate(false, Decimal::ZERO, dec("2000"), Some(3), 3);
        assert_eq!(result, Err(PromoRejection::UsageLimitReached));
    }

    /// One remaining use is still accepted
    #[test]
    fn test_last_use_accepted() {
        let result = evaluate(false, Decimal::ZERO, dec("2000"), Some(3), 2);
        assert!(result.is_ok());
    }

    /// Unlimited codes never hit a usage limit
    #[test]
    fn test_unlimited_uses() {
        let result = evaluate(false, Decimal::ZERO, dec("2000"), None, 1_000_000);
        assert!(result.is_ok());
    }

    /// Expiry comparison against now
    #[test]
    fn test_expiry_comparison() {
        let now = Utc::now();
        let yesterday = now - Duration::hours(24);
        let tomorrow = now + Duration::hours(24);

        assert!(yesterday < now); // expired
        assert!(tomorrow > now); // still valid
    }

    /// Codes are matched case-insensitively after trimming
    #[test]
    fn test_code_normalization() {
        assert_eq!(normalize_code("save10"), "SAVE10");
        assert_eq!(normalize_code("  Save10  "), "SAVE10");
        assert_eq!(normalize_code("SAVE10"), "SAVE10");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for cart amounts
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 10000.00
    }

    /// Strategy for percentage values (0 to 100)
    fn percent_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A percentage discount never exceeds the cart amount
        #[test]
        fn prop_percentage_discount_bounded(
            amount in amount_strategy(),
            percent in percent_strategy()
        ) {
            let discount = percentage_discount(percent, amount);

            prop_assert!(discount >= Decimal::ZERO);
            prop_assert!(discount <= amount);
        }

        /// The final amount after any discount is never negative
        #[test]
        fn prop_final_amount_non_negative(
            amount in amount_strategy(),
            discount in amount_strategy()
        ) {
            let final_amount = (amount - discount).max(Decimal::ZERO);

            prop_assert!(final_amount >= Decimal::ZERO);
            prop_assert!(final_amount <= amount);
        }

        /// Normalization is idempotent
        #[test]
        fn prop_normalization_idempotent(code in "[a-zA-Z0-9 ]{1,20}") {
            let once = normalize_code(&code);
            let twice = normalize_code(&once);

            prop_assert_eq!(once, twice);
        }

        /// Evaluation never accepts a cart strictly below the minimum
        #[test]
        fn prop_minimum_enforced(
            amount in amount_strategy(),
            min_amount in amount_strategy()
        ) {
            let result = evaluate(false, min_amount, amount, None, 0);

            if amount < min_amount {
                prop_assert_eq!(result, Err(PromoRejection::BelowMinimum));
            } else {
                prop_assert!(result.is_ok());
            }
        }

        /// Redemption count never exceeds the limit
        #[test]
        fn prop_usage_limit_enforced(
            max_uses in 1i32..100,
            used_count in 0i32..200
        ) {
            let result = evaluate(false, Decimal::ZERO, dec("100"), Some(max_uses), used_count);

            if used_count >= max_uses {
                prop_assert_eq!(result, Err(PromoRejection::UsageLimitReached));
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
