//! Guardians - the party legally and financially responsible for residents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{digits_only, GuardianId};

/// A guardian record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    /// Stable identifier
    pub id: GuardianId,
    /// Full name as typed by the operator
    pub name: String,
    /// Tax id; optional at creation, required to act as payer of record
    pub document_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Inactive guardians stay on file for the residents that reference them
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guardian {
    /// Builds a guardian from a creation request and an assigned id
    pub fn from_request(id: GuardianId, request: NewGuardian) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: request.name.trim().to_string(),
            document_number: non_blank(request.document_number),
            phone: non_blank(request.phone),
            email: non_blank(request.email),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when a non-empty document number is on file
    pub fn has_document(&self) -> bool {
        self.document_number
            .as_deref()
            .map(|doc| !digits_only(doc).is_empty())
            .unwrap_or(false)
    }

    /// Marks the guardian inactive
    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}

/// Request for creating a guardian
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewGuardian {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 32))]
    pub document_number: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl NewGuardian {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document_number = Some(document.into());
        self
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_trims_and_drops_blank_fields() {
        let request = NewGuardian {
            name: "  Ana Souza ".to_string(),
            document_number: Some("   ".to_string()),
            phone: Some("(11) 9999-0000".to_string()),
            email: None,
        };
        let guardian = Guardian::from_request(GuardianId::new(1), request);

        assert_eq!(guardian.name, "Ana Souza");
        assert!(guardian.document_number.is_none());
        assert!(!guardian.has_document());
        assert!(guardian.active);
    }

    #[test]
    fn test_request_validation_rejects_bad_email() {
        let request = NewGuardian {
            email: Some("not-an-email".to_string()),
            ..NewGuardian::named("Ana")
        };
        assert!(request.validate().is_err());
        assert!(NewGuardian::named("").validate().is_err());
        assert!(NewGuardian::named("Ana").validate().is_ok());
    }
}
