//! The dataset a backup covers

use std::sync::Arc;

use core_kernel::settings::memory::InMemorySettingsPort;
use core_kernel::SettingsPort;
use domain_billing::{InMemoryInvoicePort, InMemoryPaymentPort, InvoicePort, PaymentPort};
use domain_registry::{GuardianPort, InMemoryGuardianPort, InMemoryResidentPort, ResidentPort};

/// Handles to every collection that is exported and restored
#[derive(Clone)]
pub struct BackupStore {
    pub guardians: Arc<dyn GuardianPort>,
    pub residents: Arc<dyn ResidentPort>,
    pub payments: Arc<dyn PaymentPort>,
    pub invoices: Arc<dyn InvoicePort>,
    pub settings: Arc<dyn SettingsPort>,
}

impl BackupStore {
    pub fn new(
        guardians: Arc<dyn GuardianPort>,
        residents: Arc<dyn ResidentPort>,
        payments: Arc<dyn PaymentPort>,
        invoices: Arc<dyn InvoicePort>,
        settings: Arc<dyn SettingsPort>,
    ) -> Self {
        Self {
            guardians,
            residents,
            payments,
            invoices,
            settings,
        }
    }

    /// An empty store held in memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryGuardianPort::new()),
            Arc::new(InMemoryResidentPort::new()),
            Arc::new(InMemoryPaymentPort::new()),
            Arc::new(InMemoryInvoicePort::new()),
            Arc::new(InMemorySettingsPort::new()),
        )
    }
}
