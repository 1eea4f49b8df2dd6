//! Restore importer
//!
//! Reads a backup in two passes. The first pass decodes every record and
//! collects the ones it cannot read; the second applies the decoded rows in
//! dependency order (guardians, residents, payments, invoices, config) so a
//! row may reference one that appears later in the file.
//!
//! Import never updates: a row whose id (or key, for CONFIG) is already in
//! the store is skipped, which makes importing the same file twice safe.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder};
use tracing::{debug, info, instrument, warn};

use core_kernel::{GuardianId, InvoiceId, PaymentId, PortError, ResidentId, Setting};
use domain_billing::{Invoice, Payment};
use domain_registry::{Guardian, Resident};

use crate::error::BackupError;
use crate::layout::{Column, RowTag};
use crate::report::{ImportIssue, ImportReport};
use crate::row::BackupRow;
use crate::store::BackupStore;

/// A decoded row waiting to be applied
struct PendingRow {
    row_number: u64,
    row: BackupRow,
}

/// Restores the rows of `reader` into `store`
#[instrument(skip_all)]
pub async fn import_from_reader<R: Read>(
    store: &BackupStore,
    mut reader: R,
) -> Result<ImportReport, BackupError> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;

    let mut report = ImportReport::default();
    let mut pending = read_rows(&input, &mut report)?;
    pending.sort_by_key(|p| p.row.tag());

    let mut importer = Importer::load(store, report).await?;
    for PendingRow { row_number, row } in pending {
        importer.apply(row_number, row).await?;
    }

    let report = importer.report;
    info!(
        inserted = report.inserted.total(),
        skipped = report.skipped.total(),
        issues = report.issues.len(),
        warnings = report.warnings.len(),
        "backup imported"
    );
    Ok(report)
}

/// Restores a backup file
pub async fn import_from_path(store: &BackupStore, path: &Path) -> Result<ImportReport, BackupError> {
    info!(path = %path.display(), "importing backup");
    import_from_reader(store, File::open(path)?).await
}

/// Maps record start offsets to 1-based file lines
///
/// The reader reports where it stopped after the previous record, which may
/// be the start of blank lines it skips before the next one.
struct LineCounter<'a> {
    input: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
        }
    }

    /// Offsets must be passed in increasing order
    fn line_at(&mut self, byte: u64) -> u64 {
        let mut start = usize::try_from(byte).unwrap_or(usize::MAX).min(self.input.len());
        while start < self.input.len() && matches!(self.input[start], b'\n' | b'\r') {
            start += 1;
        }
        if start > self.offset {
            self.line += self.input[self.offset..start].iter().filter(|&&b| b == b'\n').count() as u64;
            self.offset = start;
        }
        self.line
    }
}

/// First pass: decode every record, in file order
fn read_rows(input: &[u8], report: &mut ImportReport) -> Result<Vec<PendingRow>, BackupError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut lines = LineCounter::new(input);

    let mut pending = Vec::new();
    let mut last_line = 0;
    for (index, result) in csv.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let row_number = e.position().map_or(last_line + 1, |p| lines.line_at(p.byte()));
                last_line = row_number;
                warn!(row = row_number, error = %e, "unreadable record");
                report.issues.push(ImportIssue::MalformedRow {
                    row: row_number,
                    tag: String::new(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let row_number = record.position().map_or(last_line + 1, |p| lines.line_at(p.byte()));
        last_line = row_number;

        let cell = record.get(Column::Type.index()).unwrap_or("").trim();
        let Some(tag) = RowTag::parse(cell) else {
            if index == 0 {
                debug!(first_cell = cell, "skipping header row");
            } else {
                warn!(row = row_number, tag = cell, "unknown row type");
                report.issues.push(ImportIssue::UnknownRowType {
                    row: row_number,
                    tag: cell.to_string(),
                });
            }
            continue;
        };

        match BackupRow::decode(tag, &record, row_number) {
            Ok(decoded) => {
                report.warnings.extend(decoded.warnings);
                pending.push(PendingRow {
                    row_number,
                    row: decoded.row,
                });
            }
            Err(e) => {
                warn!(row = row_number, %tag, error = %e, "malformed row");
                report.issues.push(ImportIssue::MalformedRow {
                    row: row_number,
                    tag: tag.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(pending)
}

/// Second pass state: the ids the store holds so far
struct Importer<'a> {
    store: &'a BackupStore,
    report: ImportReport,
    guardians: HashSet<GuardianId>,
    residents: HashSet<ResidentId>,
    payments: HashSet<PaymentId>,
    invoices: HashSet<InvoiceId>,
    /// Payments already linked to an active invoice, and by which one
    invoiced_payments: HashMap<PaymentId, InvoiceId>,
}

impl<'a> Importer<'a> {
    async fn load(store: &'a BackupStore, report: ImportReport) -> Result<Self, BackupError> {
        let invoices = store.invoices.list_invoices().await?;
        let invoiced_payments = invoices
            .iter()
            .filter(|i| i.is_active())
            .filter_map(|i| i.payment_id.map(|payment_id| (payment_id, i.id)))
            .collect();
        Ok(Self {
            guardians: store.guardians.list_guardians().await?.iter().map(|g| g.id).collect(),
            residents: store.residents.list_residents().await?.iter().map(|r| r.id).collect(),
            payments: store.payments.list_payments().await?.iter().map(|p| p.id).collect(),
            invoices: invoices.iter().map(|i| i.id).collect(),
            invoiced_payments,
            store,
            report,
        })
    }

    async fn apply(&mut self, row_number: u64, row: BackupRow) -> Result<(), BackupError> {
        let tag = row.tag();
        let inserted = match row {
            BackupRow::Guardian(guardian) => self.guardian(guardian).await?,
            BackupRow::Resident(resident) => self.resident(row_number, resident).await?,
            BackupRow::Payment(payment) => self.payment(row_number, payment).await?,
            BackupRow::Invoice(invoice) => self.invoice(row_number, invoice).await?,
            BackupRow::Config(setting) => self.setting(setting).await?,
        };
        match inserted {
            Some(true) => self.report.inserted.add(tag),
            Some(false) => {
                debug!(row = row_number, %tag, "already present, skipped");
                self.report.skipped.add(tag);
            }
            None => {}
        }
        Ok(())
    }

    /// `Some(true)` inserted, `Some(false)` skipped, `None` refused with an issue
    async fn guardian(&mut self, guardian: Guardian) -> Result<Option<bool>, BackupError> {
        if !self.guardians.insert(guardian.id) {
            return Ok(Some(false));
        }
        self.store.guardians.insert_guardian(guardian).await?;
        Ok(Some(true))
    }

    async fn resident(&mut self, row: u64, resident: Resident) -> Result<Option<bool>, BackupError> {
        if self.residents.contains(&resident.id) {
            return Ok(Some(false));
        }
        if !self.guardians.contains(&resident.guardian_id) {
            self.dangling(row, RowTag::Resident, resident.id, Column::GuardianId, RowTag::Guardian);
            return Ok(None);
        }
        self.residents.insert(resident.id);
        self.store.residents.insert_resident(resident).await?;
        Ok(Some(true))
    }

    async fn payment(&mut self, row: u64, payment: Payment) -> Result<Option<bool>, BackupError> {
        if self.payments.contains(&payment.id) {
            return Ok(Some(false));
        }
        if !self.residents.contains(&payment.resident_id) {
            self.dangling(row, RowTag::Payment, payment.id, Column::ResidentId, RowTag::Resident);
            return Ok(None);
        }
        if let Some(existing) = self
            .store
            .payments
            .find_by_period(payment.resident_id, payment.period)
            .await?
        {
            self.period_conflict(row, &payment, existing.id);
            return Ok(None);
        }

        let id = payment.id;
        match self.store.payments.insert_payment(payment.clone()).await {
            Ok(_) => {
                self.payments.insert(id);
                Ok(Some(true))
            }
            Err(e) if e.is_conflict() => self.payment_refused(row, &payment, e).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn payment_refused(
        &mut self,
        row: u64,
        payment: &Payment,
        error: PortError,
    ) -> Result<Option<bool>, BackupError> {
        match self
            .store
            .payments
            .find_by_period(payment.resident_id, payment.period)
            .await?
        {
            Some(existing) => self.period_conflict(row, payment, existing.id),
            None => {
                warn!(row, payment_id = %payment.id, error = %error, "payment refused by store");
                self.report.issues.push(ImportIssue::MalformedRow {
                    row,
                    tag: RowTag::Payment.to_string(),
                    reason: error.to_string(),
                });
            }
        }
        Ok(None)
    }

    async fn invoice(&mut self, row: u64, invoice: Invoice) -> Result<Option<bool>, BackupError> {
        if self.invoices.contains(&invoice.id) {
            return Ok(Some(false));
        }
        if let Some(resident_id) = invoice.resident_id {
            if !self.residents.contains(&resident_id) {
                self.dangling(row, RowTag::Invoice, invoice.id, Column::ResidentId, RowTag::Resident);
                return Ok(None);
            }
        }
        if let Some(payment_id) = invoice.payment_id {
            if !self.payments.contains(&payment_id) {
                self.dangling(row, RowTag::Invoice, invoice.id, Column::PaymentId, RowTag::Payment);
                return Ok(None);
            }
            if invoice.is_active() {
                if let Some(&existing_invoice_id) = self.invoiced_payments.get(&payment_id) {
                    warn!(row, invoice_id = %invoice.id, %payment_id, %existing_invoice_id, "payment already invoiced");
                    self.report.issues.push(ImportIssue::PaymentAlreadyInvoiced {
                        row,
                        invoice_id: invoice.id,
                        payment_id,
                        existing_invoice_id,
                    });
                    return Ok(None);
                }
                self.invoiced_payments.insert(payment_id, invoice.id);
            }
        }
        self.invoices.insert(invoice.id);
        self.store.invoices.insert_invoice(invoice).await?;
        Ok(Some(true))
    }

    async fn setting(&mut self, setting: Setting) -> Result<Option<bool>, BackupError> {
        if self.store.settings.get(&setting.key).await?.is_some() {
            return Ok(Some(false));
        }
        self.store.settings.insert(setting).await?;
        Ok(Some(true))
    }

    fn dangling(
        &mut self,
        row: u64,
        entity: RowTag,
        id: impl ToString,
        field: Column,
        target: RowTag,
    ) {
        let id = id.to_string();
        warn!(row, %entity, id = %id, %field, %target, "dangling reference");
        self.report.issues.push(ImportIssue::DanglingReference {
            row,
            entity,
            id,
            field,
            target,
        });
    }

    fn period_conflict(&mut self, row: u64, payment: &Payment, existing_payment_id: PaymentId) {
        warn!(
            row,
            payment_id = %payment.id,
            resident_id = %payment.resident_id,
            period = %payment.period,
            %existing_payment_id,
            "payment period already taken"
        );
        self.report.issues.push(ImportIssue::PeriodConflict {
            row,
            payment_id: payment.id,
            resident_id: payment.resident_id,
            period: payment.period,
            existing_payment_id,
        });
    }
}
