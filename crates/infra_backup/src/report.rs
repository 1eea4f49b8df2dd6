//! Export and import reports

use std::fmt;

use thiserror::Error;

use core_kernel::{InvoiceId, PaymentId, ReferencePeriod, ResidentId};

use crate::layout::{Column, RowTag};

/// Number of rows per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub guardians: usize,
    pub residents: usize,
    pub payments: usize,
    pub invoices: usize,
    pub config: usize,
}

impl TypeCounts {
    pub fn add(&mut self, tag: RowTag) {
        *self.slot(tag) += 1;
    }

    pub fn get(&self, tag: RowTag) -> usize {
        match tag {
            RowTag::Guardian => self.guardians,
            RowTag::Resident => self.residents,
            RowTag::Payment => self.payments,
            RowTag::Invoice => self.invoices,
            RowTag::Config => self.config,
        }
    }

    pub fn total(&self) -> usize {
        RowTag::ALL.iter().map(|tag| self.get(*tag)).sum()
    }

    fn slot(&mut self, tag: RowTag) -> &mut usize {
        match tag {
            RowTag::Guardian => &mut self.guardians,
            RowTag::Resident => &mut self.residents,
            RowTag::Payment => &mut self.payments,
            RowTag::Invoice => &mut self.invoices,
            RowTag::Config => &mut self.config,
        }
    }
}

impl fmt::Display for TypeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} guardians, {} residents, {} payments, {} invoices, {} config",
            self.guardians, self.residents, self.payments, self.invoices, self.config
        )
    }
}

/// Rows written by an export, per kind
pub type ExportSummary = TypeCounts;

/// A row the importer refused
///
/// Row numbers are the 1-based file lines on which the record starts, so
/// blank lines and multi-line quoted notes are counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportIssue {
    #[error("row {row}: malformed {tag} row: {reason}")]
    MalformedRow {
        row: u64,
        tag: String,
        reason: String,
    },

    #[error("row {row}: unknown row type '{tag}'")]
    UnknownRowType { row: u64, tag: String },

    #[error("row {row}: {entity} {id}: {field} points to a missing {target}")]
    DanglingReference {
        row: u64,
        entity: RowTag,
        id: String,
        field: Column,
        target: RowTag,
    },

    #[error("row {row}: payment {payment_id} for resident {resident_id} in {period} collides with payment {existing_payment_id}")]
    PeriodConflict {
        row: u64,
        payment_id: PaymentId,
        resident_id: ResidentId,
        period: ReferencePeriod,
        existing_payment_id: PaymentId,
    },

    #[error("row {row}: invoice {invoice_id} links payment {payment_id}, already invoiced by invoice {existing_invoice_id}")]
    PaymentAlreadyInvoiced {
        row: u64,
        invoice_id: InvoiceId,
        payment_id: PaymentId,
        existing_invoice_id: InvoiceId,
    },
}

impl ImportIssue {
    pub fn row(&self) -> u64 {
        match self {
            ImportIssue::MalformedRow { row, .. }
            | ImportIssue::UnknownRowType { row, .. }
            | ImportIssue::DanglingReference { row, .. }
            | ImportIssue::PeriodConflict { row, .. }
            | ImportIssue::PaymentAlreadyInvoiced { row, .. } => *row,
        }
    }
}

/// Outcome of one import
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Rows written to the store
    pub inserted: TypeCounts,
    /// Rows whose id or key was already present
    pub skipped: TypeCounts,
    /// Rows refused, in file order
    pub issues: Vec<ImportIssue>,
    /// Values replaced by defaults while decoding
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted {} ({}); skipped {}; {} issues; {} warnings",
            self.inserted.total(),
            self.inserted,
            self.skipped.total(),
            self.issues.len(),
            self.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_add_and_total() {
        let mut counts = TypeCounts::default();
        counts.add(RowTag::Guardian);
        counts.add(RowTag::Payment);
        counts.add(RowTag::Payment);

        assert_eq!(counts.payments, 2);
        assert_eq!(counts.get(RowTag::Guardian), 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_dangling_reference_message() {
        let issue = ImportIssue::DanglingReference {
            row: 4,
            entity: RowTag::Payment,
            id: "9".to_string(),
            field: Column::ResidentId,
            target: RowTag::Resident,
        };
        assert_eq!(issue.row(), 4);
        assert_eq!(
            issue.to_string(),
            "row 4: PAYMENT 9: RESIDENT_ID points to a missing RESIDENT"
        );
    }
}
