//! Invoice intake
//!
//! Accepts the field set produced by the invoice-extraction collaborator.
//! Every field is untrusted text: amounts and dates are parsed leniently,
//! and names are re-resolved against the registry. Ids the extractor may
//! have guessed are never used.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use chrono::NaiveDate;
use core_kernel::temporal::parse_date;
use core_kernel::{Money, ReferencePeriod};
use domain_registry::{EntityResolver, RegistryError, ResolvedPair};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceDraft};
use crate::services::InvoiceService;

/// Raw extraction output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedInvoice {
    pub document_number: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub service_date: Option<String>,
    pub issue_date: Option<String>,
    pub resident_name: Option<String>,
    pub resident_document: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_document: Option<String>,
    pub payer_name: Option<String>,
    /// Id guessed by the extractor; ignored
    pub resident_id: Option<String>,
}

/// What the intake did with an extraction
#[derive(Debug, Clone)]
pub struct IntakeReport {
    pub invoice: Invoice,
    /// Registry records the invoice was attached to, if a resident was named
    pub pair: Option<ResolvedPair>,
    /// Fields that could not be used as given
    pub warnings: Vec<String>,
}

impl IntakeReport {
    pub fn created_guardian(&self) -> bool {
        self.pair.as_ref().is_some_and(|p| p.guardian_created)
    }

    pub fn created_resident(&self) -> bool {
        self.pair.as_ref().is_some_and(|p| p.resident_created)
    }
}

/// Turns extraction output into stored invoices
pub struct InvoiceIntakeService {
    resolver: EntityResolver,
    invoices: InvoiceService,
}

impl InvoiceIntakeService {
    pub fn new(resolver: EntityResolver, invoices: InvoiceService) -> Self {
        Self { resolver, invoices }
    }

    #[instrument(skip(self, extracted), fields(document_number = ?extracted.document_number))]
    pub async fn ingest(&self, extracted: ExtractedInvoice) -> Result<IntakeReport, BillingError> {
        let mut warnings = Vec::new();

        if let Some(guess) = &extracted.resident_id {
            warn!(guess = %guess, "ignoring extractor resident id");
        }

        let amount = match extracted.amount.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(text) => Money::parse_lenient(text).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable invoice amount, using 0.00");
                warnings.push(format!("amount '{text}' could not be read"));
                Money::zero()
            }),
            None => Money::zero(),
        };

        let service_date = lenient_date("service_date", extracted.service_date.as_deref(), &mut warnings);
        let issue_date = lenient_date("issue_date", extracted.issue_date.as_deref(), &mut warnings);
        let period = service_date.or(issue_date).map(ReferencePeriod::containing);

        let pair = match extracted.resident_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(resident_name) => {
                let guardian_name = extracted
                    .guardian_name
                    .as_deref()
                    .or(extracted.payer_name.as_deref());
                match self
                    .resolver
                    .resolve_or_create_pair(
                        resident_name,
                        extracted.resident_document.as_deref(),
                        guardian_name,
                        extracted.guardian_document.as_deref(),
                    )
                    .await
                {
                    Ok(pair) => Some(pair),
                    Err(RegistryError::GuardianRequired { resident_name }) => {
                        warn!(%resident_name, "no guardian named, invoice left without resident");
                        warnings.push(format!(
                            "resident '{resident_name}' is unknown and no guardian was named"
                        ));
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => None,
        };

        let payer_name = extracted
            .payer_name
            .clone()
            .or_else(|| pair.as_ref().map(|p| p.guardian.name.clone()));

        let draft = InvoiceDraft {
            resident_id: pair.as_ref().map(|p| p.resident.id),
            period,
            document_number: extracted.document_number,
            description: extracted.description,
            service_date,
            issue_date,
            amount,
            payer_name,
        };
        let invoice = self.invoices.create(draft).await?;

        info!(
            invoice_id = %invoice.id,
            status = %invoice.status,
            warnings = warnings.len(),
            "extracted invoice ingested"
        );
        Ok(IntakeReport {
            invoice,
            pair,
            warnings,
        })
    }
}

fn lenient_date(field: &str, text: Option<&str>, warnings: &mut Vec<String>) -> Option<NaiveDate> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    match parse_date(text) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(field, error = %e, "unreadable date dropped");
            warnings.push(format!("{field} '{text}' could not be read"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceStatus;
    use crate::ports::memory::{InMemoryInvoicePort, InMemoryPaymentPort};
    use domain_registry::{AutoCreateDefaults, InMemoryGuardianPort, InMemoryResidentPort};
    use std::sync::Arc;

    fn intake() -> InvoiceIntakeService {
        let resolver = EntityResolver::new(
            Arc::new(InMemoryGuardianPort::new()),
            Arc::new(InMemoryResidentPort::new()),
            AutoCreateDefaults::default(),
        );
        let invoices = InvoiceService::new(
            Arc::new(InMemoryInvoicePort::new()),
            Arc::new(InMemoryPaymentPort::new()),
        );
        InvoiceIntakeService::new(resolver, invoices)
    }

    fn extraction() -> ExtractedInvoice {
        ExtractedInvoice {
            document_number: Some("000123".to_string()),
            description: Some("Serviços de acolhimento".to_string()),
            amount: Some("R$ 1.062,60".to_string()),
            service_date: Some("15/10/2025".to_string()),
            resident_name: Some("Maria Santos".to_string()),
            guardian_name: Some("Carlos Santos".to_string()),
            resident_id: Some("42".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ingest_creates_records_and_complete_invoice() {
        let service = intake();
        let report = service.ingest(extraction()).await.unwrap();

        assert!(report.created_guardian());
        assert!(report.created_resident());
        assert!(report.warnings.is_empty());
        assert_eq!(report.invoice.status, InvoiceStatus::Complete);
        assert_eq!(report.invoice.amount.to_string(), "1062.60");
        assert_eq!(report.invoice.period.unwrap().to_string(), "10/2025");
        assert_eq!(report.invoice.payer_name.as_deref(), Some("Carlos Santos"));

        let again = service.ingest(extraction()).await.unwrap();
        assert!(!again.created_resident());
        assert_eq!(again.invoice.resident_id, report.invoice.resident_id);
    }

    #[tokio::test]
    async fn test_ingest_tolerates_bad_fields() {
        let service = intake();
        let report = service
            .ingest(ExtractedInvoice {
                amount: Some("about a thousand".to_string()),
                service_date: Some("next tuesday".to_string()),
                issue_date: Some("2025-11-03".to_string()),
                guardian_name: None,
                ..extraction()
            })
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 3);
        assert!(report.pair.is_none());
        assert!(report.invoice.amount.is_zero());
        assert_eq!(report.invoice.status, InvoiceStatus::Draft);
        assert_eq!(report.invoice.period.unwrap().to_string(), "11/2025");
    }
}
