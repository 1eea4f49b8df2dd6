//! Backup file layout
//!
//! Every row of a backup shares one fixed column layout. Column 0 holds the
//! row tag; each row kind fills the columns it needs and leaves the rest
//! empty.

use std::fmt;

/// Columns of the backup layout, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Type,
    Id,
    Name,
    DocumentNumber,
    Phone,
    Email,
    Active,
    BirthDate,
    GuardianId,
    ResidentId,
    PaymentId,
    Kind,
    BaseFeeAmount,
    BenefitIncomeAmount,
    ReferenceMonth,
    ReferenceYear,
    AmountPaid,
    PaymentDate,
    InvoiceNumber,
    PayerName,
    PaymentMethod,
    Status,
    EligibleInvoiceAmount,
    DonationAmount,
    ServiceDate,
    IssueDate,
    Amount,
    Description,
    Notes,
    Value,
    CreatedAt,
    UpdatedAt,
}

/// Number of columns in every row
pub const COLUMN_COUNT: usize = 32;

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Type,
        Column::Id,
        Column::Name,
        Column::DocumentNumber,
        Column::Phone,
        Column::Email,
        Column::Active,
        Column::BirthDate,
        Column::GuardianId,
        Column::ResidentId,
        Column::PaymentId,
        Column::Kind,
        Column::BaseFeeAmount,
        Column::BenefitIncomeAmount,
        Column::ReferenceMonth,
        Column::ReferenceYear,
        Column::AmountPaid,
        Column::PaymentDate,
        Column::InvoiceNumber,
        Column::PayerName,
        Column::PaymentMethod,
        Column::Status,
        Column::EligibleInvoiceAmount,
        Column::DonationAmount,
        Column::ServiceDate,
        Column::IssueDate,
        Column::Amount,
        Column::Description,
        Column::Notes,
        Column::Value,
        Column::CreatedAt,
        Column::UpdatedAt,
    ];

    /// Position of the column in a row
    pub fn index(self) -> usize {
        self as usize
    }

    /// Header text of the column
    pub fn header(self) -> &'static str {
        match self {
            Column::Type => "TYPE",
            Column::Id => "ID",
            Column::Name => "NAME",
            Column::DocumentNumber => "DOCUMENT_NUMBER",
            Column::Phone => "PHONE",
            Column::Email => "EMAIL",
            Column::Active => "ACTIVE",
            Column::BirthDate => "BIRTH_DATE",
            Column::GuardianId => "GUARDIAN_ID",
            Column::ResidentId => "RESIDENT_ID",
            Column::PaymentId => "PAYMENT_ID",
            Column::Kind => "KIND",
            Column::BaseFeeAmount => "BASE_FEE_AMOUNT",
            Column::BenefitIncomeAmount => "BENEFIT_INCOME_AMOUNT",
            Column::ReferenceMonth => "REFERENCE_MONTH",
            Column::ReferenceYear => "REFERENCE_YEAR",
            Column::AmountPaid => "AMOUNT_PAID",
            Column::PaymentDate => "PAYMENT_DATE",
            Column::InvoiceNumber => "INVOICE_NUMBER",
            Column::PayerName => "PAYER_NAME",
            Column::PaymentMethod => "PAYMENT_METHOD",
            Column::Status => "STATUS",
            Column::EligibleInvoiceAmount => "ELIGIBLE_INVOICE_AMOUNT",
            Column::DonationAmount => "DONATION_AMOUNT",
            Column::ServiceDate => "SERVICE_DATE",
            Column::IssueDate => "ISSUE_DATE",
            Column::Amount => "AMOUNT",
            Column::Description => "DESCRIPTION",
            Column::Notes => "NOTES",
            Column::Value => "VALUE",
            Column::CreatedAt => "CREATED_AT",
            Column::UpdatedAt => "UPDATED_AT",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// The header row written at the top of every backup
pub fn header_record() -> [&'static str; COLUMN_COUNT] {
    Column::ALL.map(Column::header)
}

/// Row kinds, in the order they are written and applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowTag {
    Guardian,
    Resident,
    Payment,
    Invoice,
    Config,
}

impl RowTag {
    pub const ALL: [RowTag; 5] = [
        RowTag::Guardian,
        RowTag::Resident,
        RowTag::Payment,
        RowTag::Invoice,
        RowTag::Config,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowTag::Guardian => "GUARDIAN",
            RowTag::Resident => "RESIDENT",
            RowTag::Payment => "PAYMENT",
            RowTag::Invoice => "INVOICE",
            RowTag::Config => "CONFIG",
        }
    }

    /// Reads a tag cell; case and surrounding spaces are ignored
    pub fn parse(cell: &str) -> Option<Self> {
        match cell.trim().to_ascii_uppercase().as_str() {
            "GUARDIAN" => Some(RowTag::Guardian),
            "RESIDENT" => Some(RowTag::Resident),
            "PAYMENT" => Some(RowTag::Payment),
            "INVOICE" => Some(RowTag::Invoice),
            "CONFIG" => Some(RowTag::Config),
            _ => None,
        }
    }
}

impl fmt::Display for RowTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_declaration_order() {
        for (position, column) in Column::ALL.iter().enumerate() {
            assert_eq!(column.index(), position);
        }
        assert_eq!(Column::UpdatedAt.index(), COLUMN_COUNT - 1);
    }

    #[test]
    fn test_header_starts_with_type_and_id() {
        let header = header_record();
        assert_eq!(header[0], "TYPE");
        assert_eq!(header[1], "ID");
        assert_eq!(header[COLUMN_COUNT - 1], "UPDATED_AT");
    }

    #[test]
    fn test_tag_parsing_is_lenient_about_case() {
        assert_eq!(RowTag::parse(" payment "), Some(RowTag::Payment));
        assert_eq!(RowTag::parse("TYPE"), None);
    }
}
