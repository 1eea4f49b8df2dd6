//! Registry validation rules
//!
//! # Guardians
//! - Must have a non-blank name
//! - A missing document number is a warning at registration time, but an
//!   error when the guardian is used as payer of record
//!
//! # Residents
//! - Must have a non-blank name
//! - Fee and benefit cannot be negative
//! - Birth date cannot be in the future
//! - SOCIAL residents without a benefit produce a warning

use chrono::Utc;

use crate::guardian::Guardian;
use crate::resident::{Resident, ResidentKind};

/// Errors block a registration; warnings are reported back to the caller
/// alongside the stored record.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, note: impl Into<String>) {
        self.warnings.push(note.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for registry entities
pub struct RegistryValidator;

impl RegistryValidator {
    /// Validates a guardian record
    pub fn validate_guardian(guardian: &Guardian) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if guardian.name.trim().is_empty() {
            result.add_error(format!("Guardian {} has an empty name", guardian.id));
        }
        if !guardian.has_document() {
            result.add_warning(format!(
                "Guardian {} ({}) has no document number",
                guardian.id, guardian.name
            ));
        }

        result
    }

    /// Validates a guardian about to be recorded as the payer of a payment
    pub fn validate_as_payer(guardian: &Guardian) -> ValidationResult {
        let mut result = Self::validate_guardian(guardian);
        result.warnings.clear();

        if !guardian.has_document() {
            result.add_error(format!(
                "Guardian {} ({}) needs a document number to be the payer of record",
                guardian.id, guardian.name
            ));
        }
        if !guardian.active {
            result.add_warning(format!("Guardian {} ({}) is inactive", guardian.id, guardian.name));
        }

        result
    }

    /// Validates a resident record
    pub fn validate_resident(resident: &Resident) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let label = format!("Resident {} ({})", resident.id, resident.name);

        if resident.name.trim().is_empty() {
            result.add_error(format!("Resident {} has an empty name", resident.id));
        }
        if resident.base_fee_amount.is_negative() {
            result.add_error(format!("{label}: base fee cannot be negative"));
        }
        if resident.benefit_income_amount.is_negative() {
            result.add_error(format!("{label}: benefit income cannot be negative"));
        }
        if let Some(birth_date) = resident.birth_date {
            if birth_date > Utc::now().date_naive() {
                result.add_error(format!("{label}: birth date {birth_date} is in the future"));
            }
        }
        if resident.kind == ResidentKind::Social && resident.benefit_income_amount.is_zero() {
            result.add_warning(format!("{label}: SOCIAL resident without declared benefit"));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardian::NewGuardian;
    use crate::resident::NewResident;
    use chrono::NaiveDate;
    use core_kernel::{GuardianId, Money, ResidentId};
    use rust_decimal_macros::dec;

    fn guardian(document: Option<&str>) -> Guardian {
        let mut request = NewGuardian::named("Carlos Lima");
        request.document_number = document.map(str::to_string);
        Guardian::from_request(GuardianId::new(3), request)
    }

    #[test]
    fn test_guardian_without_document_is_warning_only() {
        let result = RegistryValidator::validate_guardian(&guardian(None));
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_payer_requires_document() {
        let result = RegistryValidator::validate_as_payer(&guardian(None));
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Carlos Lima"));

        let result = RegistryValidator::validate_as_payer(&guardian(Some("123.456.789-00")));
        assert!(result.is_valid);
    }

    #[test]
    fn test_resident_negative_benefit_is_error() {
        let mut resident = Resident::from_request(
            ResidentId::new(1),
            NewResident::new("Maria", GuardianId::new(3)),
        );
        resident.benefit_income_amount = Money::new(dec!(-1));
        let result = RegistryValidator::validate_resident(&resident);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_resident_future_birth_date_is_error() {
        let mut resident = Resident::from_request(
            ResidentId::new(1),
            NewResident::new("Maria", GuardianId::new(3)),
        );
        resident.birth_date = NaiveDate::from_ymd_opt(2999, 1, 1);
        assert!(!RegistryValidator::validate_resident(&resident).is_valid);
    }
}
