//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use core_kernel::{Money, ReferencePeriod};
use domain_registry::ResidentKind;
use proptest::prelude::*;

/// Strategy for non-negative amounts in cents, up to 100 000.00
pub fn cents_strategy() -> impl Strategy<Value = i64> {
    0i64..10_000_000i64
}

/// Strategy for non-negative Money values
pub fn money_strategy() -> impl Strategy<Value = Money> {
    cents_strategy().prop_map(Money::from_cents)
}

/// Strategy for resident kinds
pub fn resident_kind_strategy() -> impl Strategy<Value = ResidentKind> {
    prop_oneof![Just(ResidentKind::Regular), Just(ResidentKind::Social)]
}

/// Strategy for valid reference periods
pub fn period_strategy() -> impl Strategy<Value = ReferencePeriod> {
    (1u32..=12, 2000i32..2100).prop_map(|(month, year)| {
        ReferencePeriod::new(month, year).expect("month within 1..=12")
    })
}

/// Strategy for person names, optionally accented
pub fn person_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zà-ö]{1,10}( [A-Z][a-zà-ö]{1,10}){1,3}"
}

/// Strategy for free text including CSV-hostile characters
pub fn free_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ,;\"'\\n]{0,40}"
}
