//! Billing Domain Ports
//!
//! Storage interfaces for payments and invoices.

use async_trait::async_trait;

use core_kernel::{DomainPort, InvoiceId, PaymentId, PortError, ReferencePeriod, ResidentId};

use crate::invoice::Invoice;
use crate::payment::Payment;

/// Storage port for payments
///
/// Implementations keep `(resident_id, period)` unique.
#[async_trait]
pub trait PaymentPort: DomainPort {
    /// Lists every payment, ordered by id
    async fn list_payments(&self) -> Result<Vec<Payment>, PortError>;

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// The payment of a resident for a period, if any
    async fn find_by_period(
        &self,
        resident_id: ResidentId,
        period: ReferencePeriod,
    ) -> Result<Option<Payment>, PortError>;

    /// Stores a payment under a freshly assigned id; the id carried by
    /// `payment` is ignored
    async fn create_payment(&self, payment: Payment) -> Result<Payment, PortError>;

    /// Stores a payment under its own id
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, PortError>;

    async fn update_payment(&self, payment: Payment) -> Result<Payment, PortError>;

    async fn payments_of(&self, resident_id: ResidentId) -> Result<Vec<Payment>, PortError> {
        Ok(self
            .list_payments()
            .await?
            .into_iter()
            .filter(|p| p.resident_id == resident_id)
            .collect())
    }
}

/// Storage port for invoices
#[async_trait]
pub trait InvoicePort: DomainPort {
    /// Lists every invoice, ordered by id
    async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError>;

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Stores an invoice under a freshly assigned id
    async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice, PortError>;

    /// Stores an invoice under its own id
    async fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, PortError>;

    async fn update_invoice(&self, invoice: Invoice) -> Result<Invoice, PortError>;

    /// Physically removes an invoice
    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError>;

    /// Non-cancelled invoices linked to a payment
    async fn active_invoices_for(&self, payment_id: PaymentId) -> Result<Vec<Invoice>, PortError> {
        Ok(self
            .list_invoices()
            .await?
            .into_iter()
            .filter(|i| i.payment_id == Some(payment_id) && i.is_active())
            .collect())
    }
}

/// In-memory implementations of the billing ports
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory payment store
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryPaymentPort {
        payments: Arc<RwLock<BTreeMap<PaymentId, Payment>>>,
    }

    impl InMemoryPaymentPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for InMemoryPaymentPort {}

    fn period_taken(
        payments: &BTreeMap<PaymentId, Payment>,
        candidate: &Payment,
    ) -> Option<PaymentId> {
        payments
            .values()
            .find(|p| {
                p.id != candidate.id
                    && p.resident_id == candidate.resident_id
                    && p.period == candidate.period
            })
            .map(|p| p.id)
    }

    #[async_trait]
    impl PaymentPort for InMemoryPaymentPort {
        async fn list_payments(&self) -> Result<Vec<Payment>, PortError> {
            Ok(self.payments.read().await.values().cloned().collect())
        }

        async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
            self.payments
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found(PaymentId::label(), id))
        }

        async fn find_by_period(
            &self,
            resident_id: ResidentId,
            period: ReferencePeriod,
        ) -> Result<Option<Payment>, PortError> {
            Ok(self
                .payments
                .read()
                .await
                .values()
                .find(|p| p.resident_id == resident_id && p.period == period)
                .cloned())
        }

        async fn create_payment(&self, mut payment: Payment) -> Result<Payment, PortError> {
            let mut payments = self.payments.write().await;
            payment.id = payments
                .keys()
                .next_back()
                .map(PaymentId::next)
                .unwrap_or(PaymentId::new(1));
            if let Some(existing) = period_taken(&payments, &payment) {
                return Err(PortError::conflict(format!(
                    "Resident {} already has payment {} for {}",
                    payment.resident_id, existing, payment.period
                )));
            }
            payments.insert(payment.id, payment.clone());
            Ok(payment)
        }

        async fn insert_payment(&self, payment: Payment) -> Result<Payment, PortError> {
            let mut payments = self.payments.write().await;
            if payments.contains_key(&payment.id) {
                return Err(PortError::conflict(format!(
                    "Payment {} already exists",
                    payment.id
                )));
            }
            if let Some(existing) = period_taken(&payments, &payment) {
                return Err(PortError::conflict(format!(
                    "Resident {} already has payment {} for {}",
                    payment.resident_id, existing, payment.period
                )));
            }
            payments.insert(payment.id, payment.clone());
            Ok(payment)
        }

        async fn update_payment(&self, payment: Payment) -> Result<Payment, PortError> {
            let mut payments = self.payments.write().await;
            if !payments.contains_key(&payment.id) {
                return Err(PortError::not_found(PaymentId::label(), payment.id));
            }
            if let Some(existing) = period_taken(&payments, &payment) {
                return Err(PortError::conflict(format!(
                    "Resident {} already has payment {} for {}",
                    payment.resident_id, existing, payment.period
                )));
            }
            payments.insert(payment.id, payment.clone());
            Ok(payment)
        }
    }

    /// In-memory invoice store
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryInvoicePort {
        invoices: Arc<RwLock<BTreeMap<InvoiceId, Invoice>>>,
    }

    impl InMemoryInvoicePort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for InMemoryInvoicePort {}

    #[async_trait]
    impl InvoicePort for InMemoryInvoicePort {
        async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError> {
            Ok(self.invoices.read().await.values().cloned().collect())
        }

        async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.invoices
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found(InvoiceId::label(), id))
        }

        async fn create_invoice(&self, mut invoice: Invoice) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            invoice.id = invoices
                .keys()
                .next_back()
                .map(InvoiceId::next)
                .unwrap_or(InvoiceId::new(1));
            invoices.insert(invoice.id, invoice.clone());
            Ok(invoice)
        }

        async fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            if invoices.contains_key(&invoice.id) {
                return Err(PortError::conflict(format!(
                    "Invoice {} already exists",
                    invoice.id
                )));
            }
            invoices.insert(invoice.id, invoice.clone());
            Ok(invoice)
        }

        async fn update_invoice(&self, invoice: Invoice) -> Result<Invoice, PortError> {
            let mut invoices = self.invoices.write().await;
            let slot = invoices
                .get_mut(&invoice.id)
                .ok_or_else(|| PortError::not_found(InvoiceId::label(), invoice.id))?;
            *slot = invoice.clone();
            Ok(invoice)
        }

        async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError> {
            self.invoices
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found(InvoiceId::label(), id))
        }
    }
}
