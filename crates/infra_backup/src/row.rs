//! Row codec
//!
//! One [`BackupRow`] variant per row kind, each with its own encoder and
//! decoder over the shared [`Column`] layout.
//!
//! Decoding separates two kinds of trouble:
//!
//! - structural problems (bad id, month outside 1..=12, missing required
//!   reference) reject the row with a [`DecodeError`]
//! - unreadable values (money, optional dates, timestamps, flags) fall back
//!   to a safe default and leave a warning

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use csv::StringRecord;
use thiserror::Error;
use tracing::warn;

use core_kernel::temporal::{format_date, format_timestamp, parse_date, parse_timestamp};
use core_kernel::{Money, ReferencePeriod, Setting};
use domain_billing::{Invoice, InvoiceStatus, Payment, PaymentStatus};
use domain_registry::{Guardian, Resident, ResidentKind};

use crate::layout::{Column, RowTag, COLUMN_COUNT};

/// A row that cannot be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{column} '{value}': {reason}")]
pub struct DecodeError {
    pub column: Column,
    pub value: String,
    pub reason: String,
}

impl DecodeError {
    fn new(column: Column, value: &str, reason: impl Into<String>) -> Self {
        Self {
            column,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A typed backup row
#[derive(Debug, Clone, PartialEq)]
pub enum BackupRow {
    Guardian(Guardian),
    Resident(Resident),
    Payment(Payment),
    Invoice(Invoice),
    Config(Setting),
}

/// A decoded row and the values that had to be replaced by defaults
#[derive(Debug, Clone)]
pub struct Decoded {
    pub row: BackupRow,
    pub warnings: Vec<String>,
}

impl BackupRow {
    pub fn tag(&self) -> RowTag {
        match self {
            BackupRow::Guardian(_) => RowTag::Guardian,
            BackupRow::Resident(_) => RowTag::Resident,
            BackupRow::Payment(_) => RowTag::Payment,
            BackupRow::Invoice(_) => RowTag::Invoice,
            BackupRow::Config(_) => RowTag::Config,
        }
    }

    /// Id cell as written in the file; the key for CONFIG rows
    pub fn key(&self) -> String {
        match self {
            BackupRow::Guardian(g) => g.id.to_string(),
            BackupRow::Resident(r) => r.id.to_string(),
            BackupRow::Payment(p) => p.id.to_string(),
            BackupRow::Invoice(i) => i.id.to_string(),
            BackupRow::Config(s) => s.key.clone(),
        }
    }

    /// Cells of the row in layout order
    pub fn encode(&self) -> Vec<String> {
        let mut row = RowWriter::new(self.tag());
        match self {
            BackupRow::Guardian(g) => {
                row.set(Column::Id, g.id);
                row.set(Column::Name, &g.name);
                row.opt(Column::DocumentNumber, &g.document_number);
                row.opt(Column::Phone, &g.phone);
                row.opt(Column::Email, &g.email);
                row.set(Column::Active, g.active);
                row.timestamps(g.created_at, g.updated_at);
            }
            BackupRow::Resident(r) => {
                row.set(Column::Id, r.id);
                row.set(Column::Name, &r.name);
                row.opt(Column::DocumentNumber, &r.document_number);
                row.set(Column::Active, r.active);
                row.date(Column::BirthDate, r.birth_date);
                row.set(Column::GuardianId, r.guardian_id);
                row.set(Column::Kind, r.kind);
                row.set(Column::BaseFeeAmount, r.base_fee_amount);
                row.set(Column::BenefitIncomeAmount, r.benefit_income_amount);
                row.opt(Column::Notes, &r.notes);
                row.timestamps(r.created_at, r.updated_at);
            }
            BackupRow::Payment(p) => {
                row.set(Column::Id, p.id);
                row.set(Column::ResidentId, p.resident_id);
                row.set(Column::ReferenceMonth, p.period.month());
                row.set(Column::ReferenceYear, p.period.year());
                row.set(Column::AmountPaid, p.amount_paid);
                row.date(Column::PaymentDate, p.payment_date);
                row.opt(Column::InvoiceNumber, &p.invoice_number);
                row.opt(Column::PayerName, &p.payer_name);
                row.opt(Column::PaymentMethod, &p.payment_method);
                row.set(Column::Status, p.status);
                row.set(Column::EligibleInvoiceAmount, p.eligible_invoice_amount);
                row.set(Column::DonationAmount, p.donation_amount);
                row.opt(Column::Notes, &p.notes);
                row.timestamps(p.created_at, p.updated_at);
            }
            BackupRow::Invoice(i) => {
                row.set(Column::Id, i.id);
                if let Some(resident_id) = i.resident_id {
                    row.set(Column::ResidentId, resident_id);
                }
                if let Some(payment_id) = i.payment_id {
                    row.set(Column::PaymentId, payment_id);
                }
                if let Some(period) = i.period {
                    row.set(Column::ReferenceMonth, period.month());
                    row.set(Column::ReferenceYear, period.year());
                }
                row.opt(Column::InvoiceNumber, &i.document_number);
                row.opt(Column::Description, &i.description);
                row.date(Column::ServiceDate, i.service_date);
                row.date(Column::IssueDate, i.issue_date);
                row.set(Column::Amount, i.amount);
                row.opt(Column::PayerName, &i.payer_name);
                row.set(Column::Status, i.status);
                row.timestamps(i.created_at, i.updated_at);
            }
            BackupRow::Config(s) => {
                row.set(Column::Name, &s.key);
                row.set(Column::Value, &s.value);
                row.set(Column::UpdatedAt, format_timestamp(s.updated_at));
            }
        }
        row.cells
    }

    /// Decodes a record whose tag cell has already been read as `tag`
    pub fn decode(tag: RowTag, record: &StringRecord, row_number: u64) -> Result<Decoded, DecodeError> {
        let mut r = RowReader::new(record, row_number);
        let row = match tag {
            RowTag::Guardian => BackupRow::Guardian(Guardian {
                id: r.id(Column::Id)?,
                name: r.required_text(Column::Name)?,
                document_number: r.text(Column::DocumentNumber),
                phone: r.text(Column::Phone),
                email: r.text(Column::Email),
                active: r.flag(Column::Active),
                created_at: r.timestamp(Column::CreatedAt),
                updated_at: r.timestamp(Column::UpdatedAt),
            }),
            RowTag::Resident => BackupRow::Resident(Resident {
                id: r.id(Column::Id)?,
                name: r.required_text(Column::Name)?,
                document_number: r.text(Column::DocumentNumber),
                birth_date: r.date(Column::BirthDate),
                guardian_id: r.id(Column::GuardianId)?,
                base_fee_amount: r.money(Column::BaseFeeAmount),
                benefit_income_amount: r.money(Column::BenefitIncomeAmount),
                kind: r.kind(),
                active: r.flag(Column::Active),
                notes: r.text(Column::Notes),
                created_at: r.timestamp(Column::CreatedAt),
                updated_at: r.timestamp(Column::UpdatedAt),
            }),
            RowTag::Payment => BackupRow::Payment(Payment {
                id: r.id(Column::Id)?,
                resident_id: r.id(Column::ResidentId)?,
                period: r.period()?.ok_or_else(|| {
                    DecodeError::new(Column::ReferenceMonth, "", "payment needs a reference period")
                })?,
                amount_paid: r.money(Column::AmountPaid),
                payment_date: r.date(Column::PaymentDate),
                invoice_number: r.text(Column::InvoiceNumber),
                payer_name: r.text(Column::PayerName),
                payment_method: r.text(Column::PaymentMethod),
                status: r.status(PaymentStatus::Pending),
                eligible_invoice_amount: r.money(Column::EligibleInvoiceAmount),
                donation_amount: r.money(Column::DonationAmount),
                notes: r.text(Column::Notes),
                created_at: r.timestamp(Column::CreatedAt),
                updated_at: r.timestamp(Column::UpdatedAt),
            }),
            RowTag::Invoice => {
                let mut invoice = Invoice {
                    id: r.id(Column::Id)?,
                    resident_id: r.optional_id(Column::ResidentId)?,
                    payment_id: r.optional_id(Column::PaymentId)?,
                    period: r.period()?,
                    document_number: r.text(Column::InvoiceNumber),
                    description: r.text(Column::Description),
                    service_date: r.date(Column::ServiceDate),
                    issue_date: r.date(Column::IssueDate),
                    amount: r.money(Column::Amount),
                    payer_name: r.text(Column::PayerName),
                    status: r.status(InvoiceStatus::Draft),
                    created_at: r.timestamp(Column::CreatedAt),
                    updated_at: r.timestamp(Column::UpdatedAt),
                };
                if r.get(Column::Status).is_empty() {
                    invoice.refresh_status();
                }
                BackupRow::Invoice(invoice)
            }
            RowTag::Config => BackupRow::Config(Setting {
                key: r.required_text(Column::Name)?,
                value: r.raw(Column::Value).to_string(),
                updated_at: r.timestamp(Column::UpdatedAt),
            }),
        };
        Ok(Decoded {
            row,
            warnings: r.warnings,
        })
    }
}

struct RowWriter {
    cells: Vec<String>,
}

impl RowWriter {
    fn new(tag: RowTag) -> Self {
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[Column::Type.index()] = tag.as_str().to_string();
        Self { cells }
    }

    fn set(&mut self, column: Column, value: impl ToString) {
        self.cells[column.index()] = value.to_string();
    }

    fn opt(&mut self, column: Column, value: &Option<String>) {
        if let Some(value) = value {
            self.set(column, value);
        }
    }

    fn date(&mut self, column: Column, value: Option<NaiveDate>) {
        if let Some(date) = value {
            self.set(column, format_date(date));
        }
    }

    fn timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.set(Column::CreatedAt, format_timestamp(created_at));
        self.set(Column::UpdatedAt, format_timestamp(updated_at));
    }
}

struct RowReader<'a> {
    record: &'a StringRecord,
    row_number: u64,
    warnings: Vec<String>,
}

impl<'a> RowReader<'a> {
    fn new(record: &'a StringRecord, row_number: u64) -> Self {
        Self {
            record,
            row_number,
            warnings: Vec::new(),
        }
    }

    fn raw(&self, column: Column) -> &'a str {
        self.record.get(column.index()).unwrap_or("")
    }

    fn get(&self, column: Column) -> &'a str {
        self.raw(column).trim()
    }

    fn coerced(&mut self, column: Column, value: &str, fallback: &str) {
        warn!(row = self.row_number, %column, value, fallback, "unreadable value replaced");
        self.warnings.push(format!(
            "row {}: {column} '{value}' unreadable, using {fallback}",
            self.row_number
        ));
    }

    fn id<T: FromStr>(&self, column: Column) -> Result<T, DecodeError> {
        let value = self.get(column);
        if value.is_empty() {
            return Err(DecodeError::new(column, value, "required"));
        }
        value
            .parse()
            .map_err(|_| DecodeError::new(column, value, "not an integer id"))
    }

    fn optional_id<T: FromStr>(&self, column: Column) -> Result<Option<T>, DecodeError> {
        if self.get(column).is_empty() {
            Ok(None)
        } else {
            self.id(column).map(Some)
        }
    }

    fn required_text(&self, column: Column) -> Result<String, DecodeError> {
        self.text(column)
            .ok_or_else(|| DecodeError::new(column, "", "required"))
    }

    /// Free text is kept as written; blank counts as absent
    fn text(&self, column: Column) -> Option<String> {
        let value = self.raw(column);
        (!value.trim().is_empty()).then(|| value.to_string())
    }

    fn period(&self) -> Result<Option<ReferencePeriod>, DecodeError> {
        let month = self.get(Column::ReferenceMonth);
        let year = self.get(Column::ReferenceYear);
        if month.is_empty() && year.is_empty() {
            return Ok(None);
        }
        let month: u32 = month
            .parse()
            .map_err(|_| DecodeError::new(Column::ReferenceMonth, month, "not a month number"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| DecodeError::new(Column::ReferenceYear, year, "not a year"))?;
        ReferencePeriod::new(month, year)
            .map(Some)
            .map_err(|e| DecodeError::new(Column::ReferenceMonth, &month.to_string(), e.to_string()))
    }

    fn money(&mut self, column: Column) -> Money {
        let value = self.get(column);
        if value.is_empty() {
            return Money::zero();
        }
        match Money::from_str(value).or_else(|_| Money::parse_lenient(value)) {
            Ok(money) => money,
            Err(_) => {
                self.coerced(column, value, "0.00");
                Money::zero()
            }
        }
    }

    fn date(&mut self, column: Column) -> Option<NaiveDate> {
        let value = self.get(column);
        if value.is_empty() {
            return None;
        }
        match parse_date(value) {
            Ok(date) => Some(date),
            Err(_) => {
                self.coerced(column, value, "empty");
                None
            }
        }
    }

    fn timestamp(&mut self, column: Column) -> DateTime<Utc> {
        let value = self.get(column);
        match parse_timestamp(value) {
            Ok(timestamp) => timestamp,
            Err(_) => {
                self.coerced(column, value, "import time");
                Utc::now()
            }
        }
    }

    fn flag(&mut self, column: Column) -> bool {
        let value = self.get(column);
        match value.to_ascii_lowercase().as_str() {
            "" | "true" | "1" | "yes" | "sim" => true,
            "false" | "0" | "no" | "nao" | "não" => false,
            _ => {
                self.coerced(column, value, "true");
                true
            }
        }
    }

    fn kind(&mut self) -> ResidentKind {
        let value = self.get(Column::Kind);
        if value.is_empty() {
            return ResidentKind::default();
        }
        value.parse().unwrap_or_else(|_| {
            self.coerced(Column::Kind, value, "REGULAR");
            ResidentKind::Regular
        })
    }

    fn status<S: FromStr + ToString + Copy>(&mut self, fallback: S) -> S {
        let value = self.get(Column::Status);
        if value.is_empty() {
            return fallback;
        }
        value.parse().unwrap_or_else(|_| {
            self.coerced(Column::Status, value, &fallback.to_string());
            fallback
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::GuardianId;
    use domain_registry::NewGuardian;

    fn record(cells: &[(Column, &str)], tag: RowTag) -> StringRecord {
        let mut row = vec![String::new(); COLUMN_COUNT];
        row[0] = tag.as_str().to_string();
        for (column, value) in cells {
            row[column.index()] = value.to_string();
        }
        StringRecord::from(row)
    }

    #[test]
    fn test_guardian_encodes_into_shared_layout() {
        let guardian = Guardian::from_request(
            GuardianId::new(7),
            NewGuardian::named("Carlos, \"Cacá\" Lima").with_document("123"),
        );
        let cells = BackupRow::Guardian(guardian).encode();

        assert_eq!(cells.len(), COLUMN_COUNT);
        assert_eq!(cells[Column::Type.index()], "GUARDIAN");
        assert_eq!(cells[Column::Id.index()], "7");
        assert_eq!(cells[Column::Name.index()], "Carlos, \"Cacá\" Lima");
        assert_eq!(cells[Column::Active.index()], "true");
        assert!(cells[Column::AmountPaid.index()].is_empty());
    }

    #[test]
    fn test_payment_month_out_of_range_is_rejected() {
        let rec = record(
            &[
                (Column::Id, "1"),
                (Column::ResidentId, "2"),
                (Column::ReferenceMonth, "13"),
                (Column::ReferenceYear, "2025"),
            ],
            RowTag::Payment,
        );
        let err = BackupRow::decode(RowTag::Payment, &rec, 4).unwrap_err();
        assert_eq!(err.column, Column::ReferenceMonth);
    }

    #[test]
    fn test_missing_guardian_reference_is_rejected() {
        let rec = record(&[(Column::Id, "1"), (Column::Name, "Maria")], RowTag::Resident);
        let err = BackupRow::decode(RowTag::Resident, &rec, 2).unwrap_err();
        assert_eq!(err.column, Column::GuardianId);
    }

    #[test]
    fn test_unreadable_values_fall_back_with_warnings() {
        let rec = record(
            &[
                (Column::Id, "3"),
                (Column::Name, "Maria"),
                (Column::GuardianId, "1"),
                (Column::BenefitIncomeAmount, "lots"),
                (Column::BirthDate, "31/02/1940"),
                (Column::CreatedAt, "yesterday"),
                (Column::UpdatedAt, "2025-10-01T12:00:00+00:00"),
            ],
            RowTag::Resident,
        );
        let decoded = BackupRow::decode(RowTag::Resident, &rec, 5).unwrap();
        assert_eq!(decoded.warnings.len(), 3);

        match decoded.row {
            BackupRow::Resident(resident) => {
                assert!(resident.benefit_income_amount.is_zero());
                assert!(resident.birth_date.is_none());
                assert!(resident.active);
            }
            other => panic!("expected resident, got {other:?}"),
        }
    }

    #[test]
    fn test_config_row_uses_name_as_key() {
        let rec = record(
            &[
                (Column::Name, "institution_name"),
                (Column::Value, "Lar São Vicente"),
                (Column::UpdatedAt, "2025-10-01T12:00:00Z"),
            ],
            RowTag::Config,
        );
        let decoded = BackupRow::decode(RowTag::Config, &rec, 9).unwrap();
        assert_eq!(decoded.row.key(), "institution_name");
        assert!(decoded.warnings.is_empty());
    }
}
