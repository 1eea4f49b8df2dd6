//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities of the care ledger.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{GuardianId, InvoiceId, Money, PaymentId, ReferencePeriod, ResidentId, Setting};
use domain_billing::{Invoice, Payment};
use domain_registry::{Guardian, Resident, ResidentKind};
use rust_decimal_macros::dec;

use crate::builders::{
    TestGuardianBuilder, TestInvoiceBuilder, TestPaymentBuilder, TestResidentBuilder,
};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Monthly benefit income of the reference resident
    pub fn maria_benefit() -> Money {
        Money::new(dec!(1518.00))
    }

    /// What the reference resident's family paid in October 2025
    pub fn maria_paid() -> Money {
        Money::new(dec!(3225.00))
    }

    /// 70% of [`MoneyFixtures::maria_benefit`]
    pub fn maria_eligible() -> Money {
        Money::new(dec!(1062.60))
    }

    /// The part of [`MoneyFixtures::maria_paid`] above the eligible amount
    pub fn maria_donation() -> Money {
        Money::new(dec!(2162.40))
    }

    pub fn base_fee() -> Money {
        Money::new(dec!(3500.00))
    }

    pub fn zero() -> Money {
        Money::zero()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// October 2025, the reference billing month
    pub fn october_2025() -> ReferencePeriod {
        ReferencePeriod::new(10, 2025).unwrap()
    }

    pub fn november_2025() -> ReferencePeriod {
        ReferencePeriod::new(11, 2025).unwrap()
    }

    pub fn payment_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 10).unwrap()
    }

    pub fn service_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
    }

    pub fn birth_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1941, 3, 9).unwrap()
    }

    /// Fixed record timestamp
    pub fn recorded_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 30, 0).unwrap()
    }

    /// Fixed timestamp with sub-second precision
    pub fn recorded_precisely() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 15, 14, 5, 7).unwrap() + chrono::Duration::microseconds(123_456)
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn resident_name() -> &'static str {
        "Maria Santos"
    }

    pub fn guardian_name() -> &'static str {
        "Carlos Santos"
    }

    /// Accented spelling of a name also stored without accents
    pub fn accented_name() -> &'static str {
        "José da Conceição"
    }

    pub fn cpf() -> &'static str {
        "123.456.789-09"
    }

    /// Free text that needs quoting in a CSV file
    pub fn awkward_text() -> &'static str {
        "Quarto 12, ala \"B\"\nrevisar em dezembro"
    }
}

/// Fixture for IDs
pub struct IdFixtures;

impl IdFixtures {
    pub fn guardian_id() -> GuardianId {
        GuardianId::new(1)
    }

    pub fn resident_id() -> ResidentId {
        ResidentId::new(1)
    }

    pub fn payment_id() -> PaymentId {
        PaymentId::new(1)
    }

    pub fn invoice_id() -> InvoiceId {
        InvoiceId::new(1)
    }
}

/// A small but complete dataset touching every row kind
///
/// Two guardians, three residents (one SOCIAL), payments in two months, an
/// invoice linked to a payment, a cancelled invoice with no resident, and
/// two settings.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    pub guardians: Vec<Guardian>,
    pub residents: Vec<Resident>,
    pub payments: Vec<Payment>,
    pub invoices: Vec<Invoice>,
    pub settings: Vec<Setting>,
}

impl SampleDataset {
    pub fn new() -> Self {
        let carlos = TestGuardianBuilder::new()
            .with_id(1)
            .with_name(StringFixtures::guardian_name())
            .with_document(StringFixtures::cpf())
            .with_contact("(11) 98765-4321", "carlos@example.com")
            .build();
        let ana = TestGuardianBuilder::new()
            .with_id(2)
            .with_name("Ana Paula, \"Tia\" Ribeiro")
            .build();

        let maria = TestResidentBuilder::new()
            .with_id(1)
            .with_name(StringFixtures::resident_name())
            .with_guardian(1)
            .with_birth_date(TemporalFixtures::birth_date())
            .with_benefit(MoneyFixtures::maria_benefit())
            .with_notes(StringFixtures::awkward_text())
            .build();
        let jose = TestResidentBuilder::new()
            .with_id(2)
            .with_name(StringFixtures::accented_name())
            .with_guardian(2)
            .with_kind(ResidentKind::Social)
            .with_benefit(MoneyFixtures::maria_benefit())
            .build();
        let helena = TestResidentBuilder::new()
            .with_id(4)
            .with_name("Helena Prado")
            .with_guardian(1)
            .inactive()
            .build();

        let october = TestPaymentBuilder::for_resident(&maria)
            .with_id(1)
            .with_period(TemporalFixtures::october_2025())
            .with_amount_paid(MoneyFixtures::maria_paid())
            .with_payment_date(TemporalFixtures::payment_date())
            .with_invoice_number("000123")
            .with_payer("Carlos Santos")
            .with_method("PIX")
            .build();
        let november = TestPaymentBuilder::for_resident(&maria)
            .with_id(2)
            .with_period(TemporalFixtures::november_2025())
            .with_amount_paid(Money::new(dec!(500.00)))
            .build();
        let social = TestPaymentBuilder::for_resident(&jose)
            .with_id(5)
            .with_period(TemporalFixtures::october_2025())
            .with_amount_paid(Money::new(dec!(2000.00)))
            .build();

        let linked = TestInvoiceBuilder::new()
            .with_id(1)
            .for_payment(&october)
            .with_document_number("000123")
            .with_description("Serviços de acolhimento, outubro")
            .with_amount(MoneyFixtures::maria_eligible())
            .with_service_date(TemporalFixtures::service_date())
            .build();
        let orphan = TestInvoiceBuilder::new()
            .with_id(3)
            .with_amount(Money::new(dec!(10.00)))
            .cancelled()
            .build();

        let mut institution = Setting::new("institution_name", "Lar São Vicente de Paulo");
        institution.updated_at = TemporalFixtures::recorded_at();
        let mut context = Setting::new("backup_context", "lar_sao_vicente");
        context.updated_at = TemporalFixtures::recorded_precisely();

        Self {
            guardians: vec![carlos, ana],
            residents: vec![maria, jose, helena],
            payments: vec![october, november, social],
            invoices: vec![linked, orphan],
            settings: vec![institution, context],
        }
    }

    /// Number of records of every kind
    pub fn len(&self) -> usize {
        self.guardians.len()
            + self.residents.len()
            + self.payments.len()
            + self.invoices.len()
            + self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SampleDataset {
    fn default() -> Self {
        Self::new()
    }
}
