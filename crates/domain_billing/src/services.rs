//! Billing domain services
//!
//! [`PaymentService`] owns the payment upsert and keeps derived figures in
//! step with the resident. [`InvoiceService`] drives the invoice lifecycle
//! and links invoices to the payment of their period.
//!
//! # Linking
//!
//! An active invoice with a resident and a period is linked to that period's
//! payment when the payment has no other active invoice. Linking fills the
//! payment's empty invoice number from the invoice's document number.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use validator::Validate;

use core_kernel::{InvoiceId, PaymentId, PortError, ResidentId};
use domain_registry::ResidentPort;

use crate::calculator::compute_payment;
use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceDraft, InvoiceStatus};
use crate::payment::{Payment, UpsertPaymentRequest};
use crate::ports::{InvoicePort, PaymentPort};

/// Result of a delete request on an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The invoice was cancelled and is physically gone
    Removed,
    /// The invoice was active; it is now cancelled and kept
    Cancelled(Invoice),
}

/// Service for recording monthly payments
pub struct PaymentService {
    residents: Arc<dyn ResidentPort>,
    payments: Arc<dyn PaymentPort>,
    invoices: Arc<dyn InvoicePort>,
}

impl PaymentService {
    pub fn new(
        residents: Arc<dyn ResidentPort>,
        payments: Arc<dyn PaymentPort>,
        invoices: Arc<dyn InvoicePort>,
    ) -> Self {
        Self {
            residents,
            payments,
            invoices,
        }
    }

    /// Creates or updates the payment of `(resident, period)`
    ///
    /// # Errors
    ///
    /// * `InvalidReferencePeriod` - month outside 1..=12
    /// * `ResidentNotFound` - nothing is written
    #[instrument(
        skip(self, request),
        fields(
            resident_id = %request.resident_id,
            month = request.reference_month,
            year = request.reference_year
        )
    )]
    pub async fn upsert(&self, request: UpsertPaymentRequest) -> Result<Payment, BillingError> {
        let period = request.period()?;
        request.validate()?;
        let request = request.sanitized();

        let resident = self
            .residents
            .get_resident(request.resident_id)
            .await
            .map_err(|e| not_found_as(e, BillingError::ResidentNotFound(request.resident_id)))?;
        let computation = compute_payment(&resident, request.amount_paid);

        let payment = match self.payments.find_by_period(resident.id, period).await? {
            Some(mut existing) => {
                existing.apply_request(request, computation);
                let updated = self.payments.update_payment(existing).await?;
                debug!(payment_id = %updated.id, "payment updated");
                updated
            }
            None => {
                let draft = Payment::from_request(PaymentId::new(0), period, request, computation);
                let created = self.payments.create_payment(draft).await?;
                debug!(payment_id = %created.id, "payment created");
                created
            }
        };

        info!(
            payment_id = %payment.id,
            status = %payment.status,
            eligible = %payment.eligible_invoice_amount,
            donation = %payment.donation_amount,
            "payment recorded"
        );

        self.link_waiting_invoice(payment).await
    }

    /// Re-derives status, eligible amount and donation of every payment of
    /// a resident, after its benefit or kind changed
    #[instrument(skip(self))]
    pub async fn recalculate_for_resident(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Payment>, BillingError> {
        let resident = self
            .residents
            .get_resident(resident_id)
            .await
            .map_err(|e| not_found_as(e, BillingError::ResidentNotFound(resident_id)))?;

        let mut refreshed = Vec::new();
        for mut payment in self.payments.payments_of(resident_id).await? {
            let computation = compute_payment(&resident, payment.amount_paid);
            payment.apply_computation(computation);
            refreshed.push(self.payments.update_payment(payment).await?);
        }

        info!(count = refreshed.len(), "payments recalculated");
        Ok(refreshed)
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, BillingError> {
        self.payments
            .get_payment(id)
            .await
            .map_err(|e| not_found_as(e, BillingError::PaymentNotFound(id)))
    }

    async fn link_waiting_invoice(&self, payment: Payment) -> Result<Payment, BillingError> {
        let waiting = self.invoices.list_invoices().await?.into_iter().find(|i| {
            i.is_active()
                && i.payment_id.is_none()
                && i.resident_id == Some(payment.resident_id)
                && i.period == Some(payment.period)
        });

        match waiting {
            Some(invoice) => {
                let (_, payment) =
                    link_if_free(self.invoices.as_ref(), self.payments.as_ref(), invoice, payment)
                        .await?;
                Ok(payment)
            }
            None => Ok(payment),
        }
    }
}

/// Service for the invoice lifecycle
pub struct InvoiceService {
    invoices: Arc<dyn InvoicePort>,
    payments: Arc<dyn PaymentPort>,
}

impl InvoiceService {
    pub fn new(invoices: Arc<dyn InvoicePort>, payments: Arc<dyn PaymentPort>) -> Self {
        Self { invoices, payments }
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.invoices
            .get_invoice(id)
            .await
            .map_err(|e| not_found_as(e, BillingError::InvoiceNotFound(id)))
    }

    /// Stores a new invoice and links it to its period's payment
    #[instrument(skip(self, draft), fields(document_number = ?draft.document_number))]
    pub async fn create(&self, draft: InvoiceDraft) -> Result<Invoice, BillingError> {
        let invoice = self
            .invoices
            .create_invoice(Invoice::draft(InvoiceId::new(0), draft))
            .await?;
        info!(invoice_id = %invoice.id, status = %invoice.status, "invoice created");
        self.link_to_period_payment(invoice).await
    }

    /// Edits an invoice; cancelled invoices are refused
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: InvoiceId, draft: InvoiceDraft) -> Result<Invoice, BillingError> {
        let mut invoice = self.get_invoice(id).await?;
        let relink = invoice.resident_id != draft.resident_id || invoice.period != draft.period;
        invoice.apply_edit(draft)?;
        if relink {
            invoice.payment_id = None;
        }
        let invoice = self.invoices.update_invoice(invoice).await?;
        self.link_to_period_payment(invoice).await
    }

    /// Explicit status change
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        id: InvoiceId,
        target: InvoiceStatus,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.get_invoice(id).await?;
        invoice.transition_to(target)?;
        Ok(self.invoices.update_invoice(invoice).await?)
    }

    /// Soft-deletes an invoice
    pub async fn cancel(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.transition(id, InvoiceStatus::Cancelled).await
    }

    /// Deletes a cancelled invoice, cancels any other
    #[instrument(skip(self))]
    pub async fn request_delete(&self, id: InvoiceId) -> Result<DeleteOutcome, BillingError> {
        let mut invoice = self.get_invoice(id).await?;

        if invoice.status == InvoiceStatus::Cancelled {
            self.invoices.delete_invoice(id).await?;
            info!(invoice_id = %id, "invoice removed");
            return Ok(DeleteOutcome::Removed);
        }

        invoice.cancel()?;
        let invoice = self.invoices.update_invoice(invoice).await?;
        info!(invoice_id = %id, "invoice cancelled instead of removed");
        Ok(DeleteOutcome::Cancelled(invoice))
    }

    /// Links an invoice to a specific payment chosen by the operator
    #[instrument(skip(self))]
    pub async fn link_to_payment(
        &self,
        invoice_id: InvoiceId,
        payment_id: PaymentId,
    ) -> Result<(Invoice, Payment), BillingError> {
        let mut invoice = self.get_invoice(invoice_id).await?;
        let payment = self
            .payments
            .get_payment(payment_id)
            .await
            .map_err(|e| not_found_as(e, BillingError::PaymentNotFound(payment_id)))?;

        if !invoice.is_active() {
            return Err(BillingError::InvalidStatusTransition {
                from: invoice.status.to_string(),
                to: InvoiceStatus::Draft.to_string(),
            });
        }
        if let Some(other) = self
            .invoices
            .active_invoices_for(payment_id)
            .await?
            .into_iter()
            .find(|i| i.id != invoice_id)
        {
            return Err(BillingError::PaymentAlreadyInvoiced {
                payment_id,
                invoice_id: other.id,
                period: payment.period.to_string(),
            });
        }

        invoice.payment_id = None;
        link_if_free(self.invoices.as_ref(), self.payments.as_ref(), invoice, payment).await
    }

    async fn link_to_period_payment(&self, invoice: Invoice) -> Result<Invoice, BillingError> {
        let (Some(resident_id), Some(period)) = (invoice.resident_id, invoice.period) else {
            return Ok(invoice);
        };
        if invoice.payment_id.is_some() || !invoice.is_active() {
            return Ok(invoice);
        }

        match self.payments.find_by_period(resident_id, period).await? {
            Some(payment) => {
                let (invoice, _) =
                    link_if_free(self.invoices.as_ref(), self.payments.as_ref(), invoice, payment)
                        .await?;
                Ok(invoice)
            }
            None => Ok(invoice),
        }
    }
}

/// Links `invoice` to `payment` unless the payment already has another
/// active invoice; returns both records as stored
async fn link_if_free(
    invoices: &dyn InvoicePort,
    payments: &dyn PaymentPort,
    mut invoice: Invoice,
    mut payment: Payment,
) -> Result<(Invoice, Payment), BillingError> {
    let taken = invoices
        .active_invoices_for(payment.id)
        .await?
        .iter()
        .any(|i| i.id != invoice.id);
    if taken || !invoice.is_active() {
        return Ok((invoice, payment));
    }

    invoice.payment_id = Some(payment.id);
    let invoice = invoices.update_invoice(invoice).await?;

    if !payment.has_invoice_number() {
        if let Some(number) = &invoice.document_number {
            payment.invoice_number = Some(number.clone());
            payment = payments.update_payment(payment).await?;
        }
    }

    debug!(invoice_id = %invoice.id, payment_id = %payment.id, "invoice linked to payment");
    Ok((invoice, payment))
}

fn not_found_as(error: PortError, replacement: BillingError) -> BillingError {
    if error.is_not_found() {
        replacement
    } else {
        BillingError::Port(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::memory::{InMemoryInvoicePort, InMemoryPaymentPort};
    use crate::payment::PaymentStatus;
    use core_kernel::{GuardianId, Money, ReferencePeriod};
    use domain_registry::{InMemoryResidentPort, NewResident, Resident};
    use rust_decimal_macros::dec;

    struct Fixture {
        residents: Arc<InMemoryResidentPort>,
        payments: PaymentService,
        invoices: InvoiceService,
        maria: Resident,
    }

    async fn fixture() -> Fixture {
        let residents = Arc::new(InMemoryResidentPort::new());
        let payment_port = Arc::new(InMemoryPaymentPort::new());
        let invoice_port = Arc::new(InMemoryInvoicePort::new());
        let maria = residents
            .create_resident(
                NewResident::new("Maria Santos", GuardianId::new(1))
                    .with_benefit(Money::new(dec!(1518.00))),
            )
            .await
            .unwrap();

        Fixture {
            payments: PaymentService::new(residents.clone(), payment_port.clone(), invoice_port.clone()),
            invoices: InvoiceService::new(invoice_port, payment_port),
            residents,
            maria,
        }
    }

    fn october_invoice(resident: &Resident) -> InvoiceDraft {
        InvoiceDraft {
            resident_id: Some(resident.id),
            period: ReferencePeriod::new(10, 2025).ok(),
            document_number: Some("NF-77".to_string()),
            description: Some("Mensalidade outubro".to_string()),
            amount: Money::new(dec!(1062.60)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_payment() {
        let f = fixture().await;
        let first = f
            .payments
            .upsert(UpsertPaymentRequest::new(f.maria.id, 10, 2025, Money::new(dec!(500))))
            .await
            .unwrap();
        assert_eq!(first.status, PaymentStatus::Partial);

        let second = f
            .payments
            .upsert(UpsertPaymentRequest::new(f.maria.id, 10, 2025, Money::new(dec!(3225))))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, PaymentStatus::Paid);
        assert_eq!(second.donation_amount, Money::new(dec!(2162.40)));
    }

    #[tokio::test]
    async fn test_upsert_for_unknown_resident_writes_nothing() {
        let f = fixture().await;
        let result = f
            .payments
            .upsert(UpsertPaymentRequest::new(ResidentId::new(99), 10, 2025, Money::new(dec!(10))))
            .await;
        assert!(matches!(result, Err(BillingError::ResidentNotFound(_))));
        assert!(f.payments.payments.list_payments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recalculate_after_benefit_change() {
        let f = fixture().await;
        f.payments
            .upsert(UpsertPaymentRequest::new(f.maria.id, 10, 2025, Money::new(dec!(1062.60))))
            .await
            .unwrap();

        let mut maria = f.maria.clone();
        maria.benefit_income_amount = Money::new(dec!(2000));
        f.residents.update_resident(maria).await.unwrap();

        let refreshed = f.payments.recalculate_for_resident(f.maria.id).await.unwrap();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].status, PaymentStatus::Partial);
        assert_eq!(refreshed[0].eligible_invoice_amount, Money::new(dec!(1400.00)));
    }

    #[tokio::test]
    async fn test_invoice_links_to_existing_payment() {
        let f = fixture().await;
        let payment = f
            .payments
            .upsert(UpsertPaymentRequest::new(f.maria.id, 10, 2025, Money::new(dec!(3225))))
            .await
            .unwrap();

        let invoice = f.invoices.create(october_invoice(&f.maria)).await.unwrap();
        assert_eq!(invoice.payment_id, Some(payment.id));

        let payment = f.payments.get_payment(payment.id).await.unwrap();
        assert_eq!(payment.invoice_number.as_deref(), Some("NF-77"));

        let second = f.invoices.create(october_invoice(&f.maria)).await.unwrap();
        assert_eq!(second.payment_id, None);
        let result = f.invoices.link_to_payment(second.id, payment.id).await;
        assert!(matches!(result, Err(BillingError::PaymentAlreadyInvoiced { .. })));
    }

    #[tokio::test]
    async fn test_payment_upsert_picks_up_waiting_invoice() {
        let f = fixture().await;
        let invoice = f.invoices.create(october_invoice(&f.maria)).await.unwrap();
        assert_eq!(invoice.payment_id, None);

        let payment = f
            .payments
            .upsert(UpsertPaymentRequest::new(f.maria.id, 10, 2025, Money::new(dec!(1062.60))))
            .await
            .unwrap();
        assert_eq!(payment.invoice_number.as_deref(), Some("NF-77"));

        let invoice = f.invoices.get_invoice(invoice.id).await.unwrap();
        assert_eq!(invoice.payment_id, Some(payment.id));
    }

    #[tokio::test]
    async fn test_delete_cancels_then_removes() {
        let f = fixture().await;
        let invoice = f.invoices.create(october_invoice(&f.maria)).await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Complete);

        match f.invoices.request_delete(invoice.id).await.unwrap() {
            DeleteOutcome::Cancelled(cancelled) => {
                assert_eq!(cancelled.status, InvoiceStatus::Cancelled)
            }
            DeleteOutcome::Removed => panic!("complete invoice must be cancelled first"),
        }

        assert_eq!(
            f.invoices.request_delete(invoice.id).await.unwrap(),
            DeleteOutcome::Removed
        );
        assert!(matches!(
            f.invoices.get_invoice(invoice.id).await,
            Err(BillingError::InvoiceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_invoice_edit_is_refused() {
        let f = fixture().await;
        let invoice = f.invoices.create(october_invoice(&f.maria)).await.unwrap();
        f.invoices.cancel(invoice.id).await.unwrap();

        let result = f.invoices.update(invoice.id, october_invoice(&f.maria)).await;
        assert!(matches!(result, Err(BillingError::InvalidStatusTransition { .. })));
        let result = f.invoices.transition(invoice.id, InvoiceStatus::Complete).await;
        assert!(matches!(result, Err(BillingError::InvalidStatusTransition { .. })));
    }
}
