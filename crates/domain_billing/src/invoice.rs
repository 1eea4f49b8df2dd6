//! Invoice lifecycle
//!
//! ```text
//!  DRAFT <──> COMPLETE
//!    │           │
//!    └──> CANCELLED <──┘ ──> (removed)
//! ```
//!
//! An invoice is COMPLETE once it has a document number, a positive amount,
//! a resident and a description. Clearing any of them sends it back to DRAFT.
//! Cancelling is a soft delete; only a cancelled invoice can be removed, and
//! a cancelled invoice is never edited or reactivated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, InvoiceId, Money, PaymentId, ReferencePeriod, ResidentId};

use crate::error::BillingError;
use crate::payment::non_blank;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Missing one of the required fields
    #[default]
    Draft,
    /// All required fields present
    Complete,
    /// Soft-deleted
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Complete => "COMPLETE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "COMPLETE" => Ok(InvoiceStatus::Complete),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            other => Err(CoreError::unknown_code("invoice status", other)),
        }
    }
}

/// An invoice issued to a resident's guardian
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Unset until the resident is resolved
    pub resident_id: Option<ResidentId>,
    /// Payment this invoice documents
    pub payment_id: Option<PaymentId>,
    pub period: Option<ReferencePeriod>,
    /// Fiscal document number
    pub document_number: Option<String>,
    /// Discrimination text printed on the invoice
    pub description: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub amount: Money,
    pub payer_name: Option<String>,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates an invoice from a draft, already in DRAFT or COMPLETE
    pub fn draft(id: InvoiceId, draft: InvoiceDraft) -> Self {
        let now = Utc::now();
        let mut invoice = Self {
            id,
            resident_id: None,
            payment_id: None,
            period: None,
            document_number: None,
            description: None,
            service_date: None,
            issue_date: None,
            amount: Money::zero(),
            payer_name: None,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        invoice.set_fields(draft);
        invoice.refresh_status();
        invoice
    }

    /// True when every field required for COMPLETE is present
    pub fn has_required_fields(&self) -> bool {
        self.document_number.is_some()
            && self.amount.is_positive()
            && self.resident_id.is_some()
            && self.description.is_some()
    }

    /// Re-derives DRAFT/COMPLETE; a cancelled invoice stays cancelled
    pub fn refresh_status(&mut self) {
        if self.status == InvoiceStatus::Cancelled {
            return;
        }
        self.status = if self.has_required_fields() {
            InvoiceStatus::Complete
        } else {
            InvoiceStatus::Draft
        };
    }

    /// Replaces the editable fields
    pub fn apply_edit(&mut self, draft: InvoiceDraft) -> Result<(), BillingError> {
        if self.status == InvoiceStatus::Cancelled {
            return Err(self.rejected(InvoiceStatus::Draft));
        }
        self.set_fields(draft);
        self.refresh_status();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves to `target` if the lifecycle allows it
    pub fn transition_to(&mut self, target: InvoiceStatus) -> Result<(), BillingError> {
        if !self.can_transition_to(target) {
            return Err(self.rejected(target));
        }
        if target == InvoiceStatus::Complete && !self.has_required_fields() {
            return Err(self.rejected(target));
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Soft-deletes the invoice
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        self.transition_to(InvoiceStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        self.status != InvoiceStatus::Cancelled
    }

    fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self.status, target),
            (Draft, Complete) |
            (Complete, Draft) |
            (Draft, Draft) |
            (Complete, Complete) |
            (Draft, Cancelled) |
            (Complete, Cancelled)
        )
    }

    fn rejected(&self, target: InvoiceStatus) -> BillingError {
        BillingError::InvalidStatusTransition {
            from: self.status.to_string(),
            to: target.to_string(),
        }
    }

    fn set_fields(&mut self, draft: InvoiceDraft) {
        self.resident_id = draft.resident_id;
        self.period = draft.period;
        self.document_number = non_blank(draft.document_number);
        self.description = non_blank(draft.description);
        self.service_date = draft.service_date;
        self.issue_date = draft.issue_date;
        self.amount = draft.amount.non_negative();
        self.payer_name = non_blank(draft.payer_name);
    }
}

/// Editable invoice fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub resident_id: Option<ResidentId>,
    pub period: Option<ReferencePeriod>,
    pub document_number: Option<String>,
    pub description: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub amount: Money,
    pub payer_name: Option<String>,
}

impl From<&Invoice> for InvoiceDraft {
    fn from(invoice: &Invoice) -> Self {
        Self {
            resident_id: invoice.resident_id,
            period: invoice.period,
            document_number: invoice.document_number.clone(),
            description: invoice.description.clone(),
            service_date: invoice.service_date,
            issue_date: invoice.issue_date,
            amount: invoice.amount,
            payer_name: invoice.payer_name.clone(),
        }
    }
}

/// Sum of the amounts of all non-cancelled invoices
pub fn active_total(invoices: &[Invoice]) -> Money {
    invoices
        .iter()
        .filter(|i| i.is_active())
        .map(|i| i.amount)
        .sum()
}
