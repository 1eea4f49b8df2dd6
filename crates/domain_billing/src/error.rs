//! Billing domain errors

use core_kernel::{InvoiceId, PaymentId, PortError, ResidentId, TemporalError};
use domain_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Payment refers to a resident that does not exist
    #[error("Resident not found: {0}")]
    ResidentNotFound(ResidentId),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Invoice status change not allowed
    #[error("Invalid invoice status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Month outside 1..=12
    #[error(transparent)]
    InvalidReferencePeriod(#[from] TemporalError),

    /// Payment already carries another active invoice
    #[error("Payment {payment_id} ({period}) is already linked to invoice {invoice_id}")]
    PaymentAlreadyInvoiced {
        payment_id: PaymentId,
        invoice_id: InvoiceId,
        period: String,
    },

    /// Request failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Registry failure while resolving residents or guardians
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Storage port failure
    #[error(transparent)]
    Port(#[from] PortError),
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BillingError::Validation(errors.to_string())
    }
}
