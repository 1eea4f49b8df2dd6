//! Assertions for ledger values
//!
//! Failure messages name the payment and period involved so a broken
//! figure can be traced without a debugger.

use core_kernel::Money;
use domain_billing::{Payment, PaymentStatus};
use rust_decimal::Decimal;

/// Asserts that `actual` is within `tolerance` of `expected`
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    let gap = (actual.amount() - expected.amount()).abs();
    if gap > tolerance {
        panic!("amounts {actual} and {expected} are {gap} apart, over the allowed {tolerance}");
    }
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that a Money value carries at most two decimal places
pub fn assert_money_normalized(money: &Money) {
    assert!(
        money.amount() == money.amount().round_dp(2),
        "Expected a 2-decimal amount, got {}",
        money.amount()
    );
}

/// Asserts the derived figures of a payment
pub fn assert_payment_figures(
    payment: &Payment,
    status: PaymentStatus,
    eligible: &str,
    donation: &str,
) {
    assert_eq!(
        payment.status, status,
        "payment {} for {}: unexpected status",
        payment.id, payment.period
    );
    assert_eq!(
        payment.eligible_invoice_amount.to_string(),
        eligible,
        "payment {} for {}: unexpected eligible amount",
        payment.id,
        payment.period
    );
    assert_eq!(
        payment.donation_amount.to_string(),
        donation,
        "payment {} for {}: unexpected donation",
        payment.id,
        payment.period
    );
}

/// Asserts that two record lists hold the same records, ignoring order
///
/// Records are matched by `key`; the failure message names the first key
/// that differs.
pub fn assert_same_records<T, K>(actual: &[T], expected: &[T], key: impl Fn(&T) -> K)
where
    T: PartialEq + std::fmt::Debug,
    K: Ord + std::fmt::Debug,
{
    assert_eq!(
        actual.len(),
        expected.len(),
        "record count differs: actual={}, expected={}",
        actual.len(),
        expected.len()
    );
    let mut actual: Vec<&T> = actual.iter().collect();
    let mut expected: Vec<&T> = expected.iter().collect();
    actual.sort_by_key(|r| key(r));
    expected.sort_by_key(|r| key(r));
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_eq!(a, e, "record {:?} differs", key(e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_approx_eq_passes() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(100.01));
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "over the allowed")]
    fn test_assert_money_approx_eq_fails() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(101.00));
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    fn test_assert_same_records_ignores_order() {
        assert_same_records(&[3, 1, 2], &[1, 2, 3], |n| *n);
    }
}
