//! Billing Domain - Payments, Donations and Invoices
//!
//! This crate turns what a guardian paid in a month into the figures a care
//! facility reports, and keeps invoices consistent with those payments.
//!
//! # The 70% Rule
//!
//! A REGULAR resident's invoiceable amount is 70% of the declared benefit;
//! anything paid above it is recorded as a donation. A SOCIAL resident's
//! invoiceable amount is the whole benefit and never produces a donation.
//!
//! # Example
//!
//! ```rust
//! use domain_billing::{compute, PaymentStatus};
//! use domain_registry::ResidentKind;
//! use core_kernel::Money;
//! use rust_decimal_macros::dec;
//!
//! let result = compute(
//!     ResidentKind::Regular,
//!     Money::new(dec!(1518.00)),
//!     Money::new(dec!(3225.00)),
//! );
//!
//! assert_eq!(result.eligible_invoice_amount.to_string(), "1062.60");
//! assert_eq!(result.donation_amount.to_string(), "2162.40");
//! assert_eq!(result.status, PaymentStatus::Paid);
//! ```

pub mod calculator;
pub mod payment;
pub mod invoice;
pub mod ports;
pub mod services;
pub mod intake;
pub mod error;

pub use calculator::{compute, compute_payment, PaymentComputation, ELIGIBLE_SHARE_PERCENT};
pub use payment::{Payment, PaymentStatus, UpsertPaymentRequest};
pub use invoice::{active_total, Invoice, InvoiceDraft, InvoiceStatus};
pub use ports::{InvoicePort, PaymentPort};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::{InMemoryInvoicePort, InMemoryPaymentPort};
pub use services::{DeleteOutcome, InvoiceService, PaymentService};
pub use intake::{ExtractedInvoice, IntakeReport, InvoiceIntakeService};
pub use error::BillingError;
