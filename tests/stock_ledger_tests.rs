//! Stock ledger tests
//!
//! Tests for the movement ledger including:
//! - Delta application and the non-negative stock invariant
//! - Idempotent replay of sale-driven movements
//! - Absolute adjustments recorded as deltas

use proptest::prelude::*;
use std::collections::HashSet;

/// A recorded movement, keyed for dedup by (reason, source)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MovementKey {
    reason: &'static str,
    source_ref: u64,
}

/// In-memory model of one product's ledger
struct Ledger {
    stock: i32,
    seen: HashSet<MovementKey>,
    movements: Vec<i32>,
}

impl Ledger {
    fn new(initial: i32) -> Self {
        Self {
            stock: initial,
            seen: HashSet::new(),
            movements: Vec::new(),
        }
    }

    /// Apply a delta; sale-driven reasons dedupe on their source reference.
    fn apply(&mut self, delta: i32, key: Option<MovementKey>) -> Result<bool, ()> {
        if let Some(ref k) = key {
            if self.seen.contains(k) {
                return Ok(false); // already applied
            }
        }

        let new_stock = self.stock + delta;
        if new_stock < 0 {
            return Err(()); // insufficient stock
        }

        self.stock = new_stock;
        self.movements.push(delta);
        if let Some(k) = key {
            self.seen.insert(k);
        }
        Ok(true)
    }

    /// Set stock to an absolute value, clamped at zero
    fn set_stock(&mut self, target: i32) -> i32 {
        let target = target.max(0);
        let delta = target - self.stock;
        if delta != 0 {
            self.stock = target;
            self.movements.push(delta);
        }
        delta
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Selling decrements, cancelling restores
    #[test]
    fn test_sale_then_cancellation_round_trip() {
        let mut ledger = Ledger::new(10);

        ledger
            .apply(-3, Some(MovementKey { reason: "sale", source_ref: 1 }))
            .unwrap();
        assert_eq!(ledger.stock, 7);

        ledger
            .apply(3, Some(MovementKey { reason: "cancellation", source_ref: 1 }))
            .unwrap();
        assert_eq!(ledger.stock, 10);
    }

    /// A decrement below zero is rejected and leaves stock untouched
    #[test]
    fn test_insufficient_stock_rejected() {
        let mut ledger = Ledger::new(2);

        let result = ledger.apply(-5, None);
        assert!(result.is_err());
        assert_eq!(ledger.stock, 2);
        assert!(ledger.movements.is_empty());
    }

    /// Selling exactly the remaining stock is allowed
    #[test]
    fn test_sell_to_zero() {
        let mut ledger = Ledger::new(5);

        ledger
            .apply(-5, Some(MovementKey { reason: "sale", source_ref: 1 }))
            .unwrap();
        assert_eq!(ledger.stock, 0);
    }

    /// Replaying the same sale movement is a no-op
    #[test]
    fn test_duplicate_sale_movement_skipped() {
        let mut ledger = Ledger::new(10);
        let key = MovementKey { reason: "sale", source_ref: 42 };

        let first = ledger.apply(-4, Some(key.clone())).unwrap();
        let second = ledger.apply(-4, Some(key)).unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(ledger.stock, 6);
        assert_eq!(ledger.movements.len(), 1);
    }

    /// Two returns on the same sale carry distinct source refs
    #[test]
    fn test_separate_returns_both_apply() {
        let mut ledger = Ledger::new(0);

        ledger
            .apply(1, Some(MovementKey { reason: "return", source_ref: 100 }))
            .unwrap();
        ledger
            .apply(2, Some(MovementKey { reason: "return", source_ref: 101 }))
            .unwrap();

        assert_eq!(ledger.stock, 3);
        assert_eq!(ledger.movements.len(), 2);
    }

    /// Absolute adjustment records the delta against current stock
    #[test]
    fn test_set_stock_records_delta() {
        let mut ledger = Ledger::new(8);

        let delta = ledger.set_stock(20);
        assert_eq!(delta, 12);
        assert_eq!(ledger.stock, 20);

        let delta = ledger.set_stock(5);
        assert_eq!(delta, -15);
        assert_eq!(ledger.stock, 5);
    }

    /// Setting stock to its current value records nothing
    #[test]
    fn test_set_stock_noop() {
        let mut ledger = Ledger::new(8);

        let delta = ledger.set_stock(8);
        assert_eq!(delta, 0);
        assert!(ledger.movements.is_empty());
    }

    /// Negative targets clamp to zero
    #[test]
    fn test_set_stock_clamps_negative() {
        let mut ledger = Ledger::new(8);

        ledger.set_stock(-3);
        assert_eq!(ledger.stock, 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for movement deltas
    fn delta_strategy() -> impl Strategy<Value = i32> {
        -50i32..=50
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock always equals initial plus the sum of applied movements
        #[test]
        fn prop_stock_is_sum_of_movements(
            initial in 0i32..1000,
            deltas in prop::collection::vec(delta_strategy(), 0..30)
        ) {
            let mut ledger = Ledger::new(initial);

            for delta in deltas {
                let _ = ledger.apply(delta, None);
            }

            let replayed: i32 = ledger.movements.iter().sum();
            prop_assert_eq!(ledger.stock, initial + replayed);
        }

        /// Stock never goes negative regardless of the movement sequence
        #[test]
        fn prop_stock_never_negative(
            initial in 0i32..100,
            deltas in prop::collection::vec(delta_strategy(), 0..30)
        ) {
            let mut ledger = Ledger::new(initial);

            for delta in deltas {
                let _ = ledger.apply(delta, None);
            }

            prop_assert!(ledger.stock >= 0);
        }

        /// Replaying keyed movements changes nothing
        #[test]
        fn prop_keyed_replay_idempotent(
            initial in 100i32..1000,
            quantities in prop::collection::vec(1i32..10, 1..10)
        ) {
            let mut ledger = Ledger::new(initial);

            for (i, qty) in quantities.iter().enumerate() {
                let key = MovementKey { reason: "sale", source_ref: i as u64 };
                ledger.apply(-qty, Some(key)).unwrap();
            }

            let stock_after_first = ledger.stock;
            let count_after_first = ledger.movements.len();

            // Replay the whole batch
            for (i, qty) in quantities.iter().enumerate() {
                let key = MovementKey { reason: "sale", source_ref: i as u64 };
                ledger.apply(-qty, Some(key)).unwrap();
            }

            prop_assert_eq!(ledger.stock, stock_after_first);
            prop_assert_eq!(ledger.movements.len(), count_after_first);
        }

        /// set_stock always lands exactly on the clamped target
        #[test]
        fn prop_set_stock_reaches_target(
            initial in 0i32..1000,
            target in -100i32..1000
        ) {
            let mut ledger = Ledger::new(initial);
            ledger.set_stock(target);

            prop_assert_eq!(ledger.stock, target.max(0));
        }
    }
}
