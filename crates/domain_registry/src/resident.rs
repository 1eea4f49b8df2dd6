//! Residents - the elders under care and the billable subject

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use core_kernel::{CoreError, GuardianId, Money, ResidentId};

use crate::guardian::non_blank;

macro_rules! auto_created_tag {
    () => {
        "[auto-created]"
    };
}

/// Marker that identifies residents created by the resolver
pub const AUTO_CREATED_TAG: &str = auto_created_tag!();

/// Notes placed on residents created by the resolver
pub const AUTO_CREATED_NOTE: &str = concat!(
    auto_created_tag!(),
    " registered automatically from an invoice; review fee and benefit"
);

/// Funding category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResidentKind {
    /// Pays 70% of the benefit as invoiced fee plus a donation on top
    #[default]
    Regular,
    /// Fee equals the benefit; any shortfall is covered outside the system
    Social,
}

impl ResidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidentKind::Regular => "REGULAR",
            ResidentKind::Social => "SOCIAL",
        }
    }
}

impl fmt::Display for ResidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResidentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(ResidentKind::Regular),
            "SOCIAL" => Ok(ResidentKind::Social),
            other => Err(CoreError::unknown_code("resident kind", other)),
        }
    }
}

/// A resident record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub name: String,
    pub document_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub guardian_id: GuardianId,
    /// Monthly fee charged to the resident
    pub base_fee_amount: Money,
    /// Declared income, basis for the 70% rule
    pub benefit_income_amount: Money,
    pub kind: ResidentKind,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resident {
    /// Builds a resident from a creation request and an assigned id
    pub fn from_request(id: ResidentId, request: NewResident) -> Self {
        let mut resident = Self::draft(id, request);
        resident.apply_kind_rules();
        resident
    }

    /// The request as entered, before kind rules adjust the fee
    pub fn draft(id: ResidentId, request: NewResident) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: request.name.trim().to_string(),
            document_number: non_blank(request.document_number),
            birth_date: request.birth_date,
            guardian_id: request.guardian_id,
            base_fee_amount: request.base_fee_amount,
            benefit_income_amount: request.benefit_income_amount,
            kind: request.kind,
            active: true,
            notes: non_blank(request.notes),
            created_at: now,
            updated_at: now,
        }
    }

    /// Benefit used for calculations; missing or negative counts as zero
    pub fn benefit_basis(&self) -> Money {
        self.benefit_income_amount.non_negative()
    }

    /// SOCIAL residents' fee is their benefit, by definition
    pub fn apply_kind_rules(&mut self) {
        self.base_fee_amount = self.base_fee_amount.non_negative();
        if self.kind == ResidentKind::Social {
            self.base_fee_amount = self.benefit_basis();
        }
    }

    /// True if the resolver created this record
    pub fn is_auto_created(&self) -> bool {
        self.notes
            .as_deref()
            .map(|n| n.contains(AUTO_CREATED_TAG))
            .unwrap_or(false)
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

/// Request for creating a resident
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewResident {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 32))]
    pub document_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub guardian_id: GuardianId,
    pub base_fee_amount: Money,
    pub benefit_income_amount: Money,
    pub kind: ResidentKind,
    pub notes: Option<String>,
}

impl NewResident {
    /// A REGULAR resident with zero amounts
    pub fn new(name: impl Into<String>, guardian_id: GuardianId) -> Self {
        Self {
            name: name.into(),
            document_number: None,
            birth_date: None,
            guardian_id,
            base_fee_amount: Money::zero(),
            benefit_income_amount: Money::zero(),
            kind: ResidentKind::Regular,
            notes: None,
        }
    }

    pub fn with_benefit(mut self, benefit: Money) -> Self {
        self.benefit_income_amount = benefit;
        self
    }

    pub fn with_fee(mut self, fee: Money) -> Self {
        self.base_fee_amount = fee;
        self
    }

    pub fn with_kind(mut self, kind: ResidentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document_number = Some(document.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_social_fee_equals_benefit() {
        let request = NewResident::new("José", GuardianId::new(1))
            .with_kind(ResidentKind::Social)
            .with_fee(Money::new(dec!(4000)))
            .with_benefit(Money::new(dec!(1518)));
        let resident = Resident::from_request(ResidentId::new(1), request);
        assert_eq!(resident.base_fee_amount, Money::new(dec!(1518)));
    }

    #[test]
    fn test_negative_benefit_counts_as_zero() {
        let request = NewResident::new("José", GuardianId::new(1)).with_benefit(Money::new(dec!(-10)));
        let resident = Resident::from_request(ResidentId::new(1), request);
        assert!(resident.benefit_basis().is_zero());
    }

    #[test]
    fn test_auto_created_note_carries_tag() {
        let mut request = NewResident::new("José", GuardianId::new(1));
        request.notes = Some(AUTO_CREATED_NOTE.to_string());
        assert!(AUTO_CREATED_NOTE.starts_with(AUTO_CREATED_TAG));
        assert!(Resident::from_request(ResidentId::new(1), request).is_auto_created());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("social".parse::<ResidentKind>().unwrap(), ResidentKind::Social);
        assert_eq!(ResidentKind::Regular.to_string(), "REGULAR");
        assert!("other".parse::<ResidentKind>().is_err());
    }

    #[test]
    fn test_kind_serde_uses_uppercase_tags() {
        assert_eq!(serde_json::to_string(&ResidentKind::Social).unwrap(), "\"SOCIAL\"");
    }
}
