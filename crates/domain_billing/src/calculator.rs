//! Benefit/Donation Calculator
//!
//! Turns a resident's declared benefit and an amount paid into the figures
//! stored on a payment.
//!
//! # Rules
//!
//! | Kind    | Eligible invoice amount | Threshold for PAGO | Donation               |
//! |---------|-------------------------|--------------------|------------------------|
//! | REGULAR | 70% of benefit          | eligible amount    | paid above eligible    |
//! | SOCIAL  | benefit                 | benefit            | always 0               |
//!
//! Status is PENDENTE when nothing was paid, PAGO when the threshold is
//! reached, PARCIAL otherwise. A benefit that is missing or not positive
//! counts as zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_registry::{Resident, ResidentKind};

use crate::payment::PaymentStatus;

/// Share of the benefit that REGULAR residents can have invoiced
pub const ELIGIBLE_SHARE_PERCENT: Decimal = dec!(70);

/// Derived figures of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentComputation {
    pub status: PaymentStatus,
    pub eligible_invoice_amount: Money,
    pub donation_amount: Money,
}

/// Computes the derived payment figures for a resident
pub fn compute_payment(resident: &Resident, amount_paid: Money) -> PaymentComputation {
    compute(resident.kind, resident.benefit_basis(), amount_paid)
}

/// Computes the derived payment figures from the raw inputs
pub fn compute(kind: ResidentKind, benefit: Money, amount_paid: Money) -> PaymentComputation {
    let benefit = benefit.non_negative();
    let paid = amount_paid.non_negative();

    let (eligible, threshold, donation) = match kind {
        ResidentKind::Regular => {
            let eligible = benefit.percent(ELIGIBLE_SHARE_PERCENT);
            (eligible, eligible, paid.positive_difference(eligible))
        }
        ResidentKind::Social => (benefit, benefit, Money::zero()),
    };

    let status = if paid.is_zero() {
        PaymentStatus::Pending
    } else if paid >= threshold {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };

    PaymentComputation {
        status,
        eligible_invoice_amount: eligible,
        donation_amount: donation,
    }
}
