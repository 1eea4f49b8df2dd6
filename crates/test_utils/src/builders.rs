//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else. Timestamps are fixed so that built records
//! compare equal across runs.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{GuardianId, InvoiceId, Money, PaymentId, ReferencePeriod, ResidentId};
use domain_billing::{compute, Invoice, InvoiceDraft, Payment};
use domain_registry::{Guardian, NewGuardian, NewResident, Resident, ResidentKind};

use crate::fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for constructing test guardians
pub struct TestGuardianBuilder {
    id: GuardianId,
    request: NewGuardian,
    active: bool,
    recorded_at: DateTime<Utc>,
}

impl Default for TestGuardianBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGuardianBuilder {
    pub fn new() -> Self {
        Self {
            id: GuardianId::new(1),
            request: NewGuardian::named(StringFixtures::guardian_name()),
            active: true,
            recorded_at: TemporalFixtures::recorded_at(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = GuardianId::new(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.request.name = name.into();
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.request.document_number = Some(document.into());
        self
    }

    pub fn with_contact(mut self, phone: impl Into<String>, email: impl Into<String>) -> Self {
        self.request.phone = Some(phone.into());
        self.request.email = Some(email.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Guardian {
        let mut guardian = Guardian::from_request(self.id, self.request);
        guardian.active = self.active;
        guardian.created_at = self.recorded_at;
        guardian.updated_at = self.recorded_at;
        guardian
    }
}

/// Builder for constructing test residents
pub struct TestResidentBuilder {
    id: ResidentId,
    request: NewResident,
    active: bool,
    recorded_at: DateTime<Utc>,
}

impl Default for TestResidentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestResidentBuilder {
    pub fn new() -> Self {
        Self {
            id: ResidentId::new(1),
            request: NewResident::new(StringFixtures::resident_name(), GuardianId::new(1))
                .with_fee(MoneyFixtures::base_fee())
                .with_benefit(MoneyFixtures::maria_benefit()),
            active: true,
            recorded_at: TemporalFixtures::recorded_at(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = ResidentId::new(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.request.name = name.into();
        self
    }

    pub fn with_guardian(mut self, guardian_id: i64) -> Self {
        self.request.guardian_id = GuardianId::new(guardian_id);
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.request.document_number = Some(document.into());
        self
    }

    pub fn with_kind(mut self, kind: ResidentKind) -> Self {
        self.request.kind = kind;
        self
    }

    pub fn with_benefit(mut self, benefit: Money) -> Self {
        self.request.benefit_income_amount = benefit;
        self
    }

    pub fn with_birth_date(mut self, date: NaiveDate) -> Self {
        self.request.birth_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Resident {
        let mut resident = Resident::from_request(self.id, self.request);
        resident.active = self.active;
        resident.created_at = self.recorded_at;
        resident.updated_at = self.recorded_at;
        resident
    }
}

/// Builder for constructing test payments
///
/// Status, eligible amount and donation are derived from the resident the
/// builder was started from, the same way the payment service derives them.
pub struct TestPaymentBuilder {
    id: PaymentId,
    resident_id: ResidentId,
    kind: ResidentKind,
    benefit: Money,
    period: ReferencePeriod,
    amount_paid: Money,
    payment_date: Option<NaiveDate>,
    invoice_number: Option<String>,
    payer_name: Option<String>,
    payment_method: Option<String>,
    notes: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TestPaymentBuilder {
    pub fn for_resident(resident: &Resident) -> Self {
        Self {
            id: PaymentId::new(1),
            resident_id: resident.id,
            kind: resident.kind,
            benefit: resident.benefit_basis(),
            period: TemporalFixtures::october_2025(),
            amount_paid: Money::zero(),
            payment_date: None,
            invoice_number: None,
            payer_name: None,
            payment_method: None,
            notes: None,
            recorded_at: TemporalFixtures::recorded_precisely(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = PaymentId::new(id);
        self
    }

    /// Points the payment at another resident id without re-deriving figures
    pub fn with_resident_id(mut self, id: i64) -> Self {
        self.resident_id = ResidentId::new(id);
        self
    }

    pub fn with_period(mut self, period: ReferencePeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_amount_paid(mut self, amount: Money) -> Self {
        self.amount_paid = amount;
        self
    }

    pub fn with_payment_date(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    pub fn with_invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer_name = Some(payer.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn build(self) -> Payment {
        let computation = compute(self.kind, self.benefit, self.amount_paid);
        Payment {
            id: self.id,
            resident_id: self.resident_id,
            period: self.period,
            amount_paid: self.amount_paid,
            payment_date: self.payment_date,
            invoice_number: self.invoice_number,
            payer_name: self.payer_name,
            payment_method: self.payment_method,
            status: computation.status,
            eligible_invoice_amount: computation.eligible_invoice_amount,
            donation_amount: computation.donation_amount,
            notes: self.notes,
            created_at: self.recorded_at,
            updated_at: self.recorded_at,
        }
    }
}

/// Builder for constructing test invoices
pub struct TestInvoiceBuilder {
    id: InvoiceId,
    payment_id: Option<PaymentId>,
    draft: InvoiceDraft,
    cancelled: bool,
    recorded_at: DateTime<Utc>,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    pub fn new() -> Self {
        Self {
            id: InvoiceId::new(1),
            payment_id: None,
            draft: InvoiceDraft::default(),
            cancelled: false,
            recorded_at: TemporalFixtures::recorded_at(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = InvoiceId::new(id);
        self
    }

    /// Links the invoice to a payment, its resident and its period
    pub fn for_payment(mut self, payment: &Payment) -> Self {
        self.payment_id = Some(payment.id);
        self.draft.resident_id = Some(payment.resident_id);
        self.draft.period = Some(payment.period);
        self.draft.payer_name = payment.payer_name.clone();
        self
    }

    pub fn with_resident_id(mut self, id: i64) -> Self {
        self.draft.resident_id = Some(ResidentId::new(id));
        self
    }

    pub fn with_payment_id(mut self, id: i64) -> Self {
        self.payment_id = Some(PaymentId::new(id));
        self
    }

    pub fn with_period(mut self, period: ReferencePeriod) -> Self {
        self.draft.period = Some(period);
        self
    }

    pub fn with_document_number(mut self, number: impl Into<String>) -> Self {
        self.draft.document_number = Some(number.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.draft.description = Some(description.into());
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.draft.amount = amount;
        self
    }

    pub fn with_service_date(mut self, date: NaiveDate) -> Self {
        self.draft.service_date = Some(date);
        self.draft.issue_date = Some(date);
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn build(self) -> Invoice {
        let mut invoice = Invoice::draft(self.id, self.draft);
        invoice.payment_id = self.payment_id;
        if self.cancelled {
            invoice.cancel().expect("fresh invoice can be cancelled");
        }
        invoice.created_at = self.recorded_at;
        invoice.updated_at = self.recorded_at;
        invoice
    }
}
