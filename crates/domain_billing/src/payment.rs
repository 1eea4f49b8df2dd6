//! Monthly payments
//!
//! A resident has at most one payment per reference period. Writes go
//! through an upsert keyed by `(resident_id, period)`; the status, eligible
//! amount and donation are always derived, never typed in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use validator::Validate;

use core_kernel::{CoreError, Money, PaymentId, ReferencePeriod, ResidentId};

use crate::calculator::PaymentComputation;
use crate::error::BillingError;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Nothing paid yet
    #[default]
    #[serde(rename = "PENDENTE")]
    Pending,
    /// Paid below the threshold
    #[serde(rename = "PARCIAL")]
    Partial,
    /// Threshold reached
    #[serde(rename = "PAGO")]
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDENTE",
            PaymentStatus::Partial => "PARCIAL",
            PaymentStatus::Paid => "PAGO",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDENTE" => Ok(PaymentStatus::Pending),
            "PARCIAL" => Ok(PaymentStatus::Partial),
            "PAGO" => Ok(PaymentStatus::Paid),
            other => Err(CoreError::unknown_code("payment status", other)),
        }
    }
}

/// A payment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    pub resident_id: ResidentId,
    /// Month the payment refers to
    pub period: ReferencePeriod,
    pub amount_paid: Money,
    pub payment_date: Option<NaiveDate>,
    /// Number of the invoice issued for this payment
    pub invoice_number: Option<String>,
    pub payer_name: Option<String>,
    /// Free text (PIX, transfer, cash...)
    pub payment_method: Option<String>,
    pub status: PaymentStatus,
    pub eligible_invoice_amount: Money,
    pub donation_amount: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a payment from an upsert request and its derived figures
    pub fn from_request(
        id: PaymentId,
        period: ReferencePeriod,
        request: UpsertPaymentRequest,
        computation: PaymentComputation,
    ) -> Self {
        let now = Utc::now();
        let mut payment = Self {
            id,
            resident_id: request.resident_id,
            period,
            amount_paid: Money::zero(),
            payment_date: None,
            invoice_number: None,
            payer_name: None,
            payment_method: None,
            status: PaymentStatus::Pending,
            eligible_invoice_amount: Money::zero(),
            donation_amount: Money::zero(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        payment.apply_request(request, computation);
        payment
    }

    /// Overwrites the editable fields with a newer request
    pub fn apply_request(&mut self, request: UpsertPaymentRequest, computation: PaymentComputation) {
        self.amount_paid = request.amount_paid.non_negative();
        self.payment_date = request.payment_date;
        // a number filled in by invoice linking survives a request without one
        if let Some(number) = non_blank(request.invoice_number) {
            self.invoice_number = Some(number);
        }
        self.payer_name = non_blank(request.payer_name);
        self.payment_method = non_blank(request.payment_method);
        self.notes = non_blank(request.notes);
        self.apply_computation(computation);
    }

    /// Stores freshly derived figures
    pub fn apply_computation(&mut self, computation: PaymentComputation) {
        self.status = computation.status;
        self.eligible_invoice_amount = computation.eligible_invoice_amount;
        self.donation_amount = computation.donation_amount;
        self.updated_at = Utc::now();
    }

    pub fn has_invoice_number(&self) -> bool {
        self.invoice_number.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Request to create or update the payment of a period
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertPaymentRequest {
    pub resident_id: ResidentId,
    #[validate(range(min = 1, max = 12))]
    pub reference_month: u32,
    pub reference_year: i32,
    pub amount_paid: Money,
    pub payment_date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub payer_name: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl UpsertPaymentRequest {
    pub fn new(resident_id: ResidentId, month: u32, year: i32, amount_paid: Money) -> Self {
        Self {
            resident_id,
            reference_month: month,
            reference_year: year,
            amount_paid,
            payment_date: None,
            invoice_number: None,
            payer_name: None,
            payment_method: None,
            notes: None,
        }
    }

    pub fn period(&self) -> Result<ReferencePeriod, BillingError> {
        Ok(ReferencePeriod::new(self.reference_month, self.reference_year)?)
    }

    /// Amount paid, with negative input clamped to zero
    pub fn sanitized(mut self) -> Self {
        if self.amount_paid.is_negative() {
            warn!(
                resident_id = %self.resident_id,
                amount = %self.amount_paid,
                "negative amount paid clamped to zero"
            );
            self.amount_paid = Money::zero();
        }
        self
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(PaymentStatus::Partial.to_string(), "PARCIAL");
        assert_eq!("pago".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!(serde_json::to_string(&PaymentStatus::Pending).unwrap(), "\"PENDENTE\"");
    }

    #[test]
    fn test_negative_amount_is_clamped() {
        let request = UpsertPaymentRequest::new(ResidentId::new(1), 10, 2025, Money::new(dec!(-5)))
            .sanitized();
        assert!(request.amount_paid.is_zero());
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let request = UpsertPaymentRequest::new(ResidentId::new(1), 13, 2025, Money::zero());
        assert!(matches!(request.period(), Err(BillingError::InvalidReferencePeriod(_))));
        assert!(request.validate().is_err());
    }
}
