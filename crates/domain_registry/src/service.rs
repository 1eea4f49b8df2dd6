//! Registry service
//!
//! Operator-facing registration and maintenance of guardians and residents.
//! Creation goes through a duplicate check unless the operator has already
//! confirmed that the record is new.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;

use core_kernel::{GuardianId, PortError, ResidentId};

use crate::error::RegistryError;
use crate::guardian::{Guardian, NewGuardian};
use crate::ports::{GuardianPort, ResidentPort};
use crate::resident::{NewResident, Resident};
use crate::resolver::find_duplicates;
use crate::validation::RegistryValidator;

/// Whether registration should stop on possible duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Return the candidates instead of creating
    Check,
    /// The operator confirmed the record is new
    Confirmed,
}

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Registration<T> {
    Created(T),
    /// Existing records that look like the one being registered
    Candidates(Vec<T>),
}

impl<T> Registration<T> {
    pub fn created(self) -> Option<T> {
        match self {
            Registration::Created(record) => Some(record),
            Registration::Candidates(_) => None,
        }
    }
}

/// Service for registering and maintaining registry records
pub struct RegistryService {
    guardians: Arc<dyn GuardianPort>,
    residents: Arc<dyn ResidentPort>,
}

impl RegistryService {
    pub fn new(guardians: Arc<dyn GuardianPort>, residents: Arc<dyn ResidentPort>) -> Self {
        Self {
            guardians,
            residents,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn register_guardian(
        &self,
        request: NewGuardian,
        policy: DuplicatePolicy,
    ) -> Result<Registration<Guardian>, RegistryError> {
        request.validate()?;

        if policy == DuplicatePolicy::Check {
            let existing = self.guardians.list_guardians().await?;
            let candidates =
                find_duplicates(&existing, &request.name, request.document_number.as_deref());
            if !candidates.is_empty() {
                info!(count = candidates.len(), "possible duplicate guardians");
                return Ok(Registration::Candidates(candidates));
            }
        }

        let guardian = self.guardians.create_guardian(request).await?;
        let validation = RegistryValidator::validate_guardian(&guardian);
        for warning in &validation.warnings {
            warn!(guardian_id = %guardian.id, "{warning}");
        }
        info!(guardian_id = %guardian.id, "guardian registered");
        Ok(Registration::Created(guardian))
    }

    #[instrument(skip(self, request), fields(name = %request.name, guardian_id = %request.guardian_id))]
    pub async fn register_resident(
        &self,
        request: NewResident,
        policy: DuplicatePolicy,
    ) -> Result<Registration<Resident>, RegistryError> {
        request.validate()?;
        self.get_guardian(request.guardian_id).await?;

        if policy == DuplicatePolicy::Check {
            let existing = self.residents.list_residents().await?;
            let candidates =
                find_duplicates(&existing, &request.name, request.document_number.as_deref());
            if !candidates.is_empty() {
                info!(count = candidates.len(), "possible duplicate residents");
                return Ok(Registration::Candidates(candidates));
            }
        }

        let draft = Resident::draft(ResidentId::new(0), request.clone());
        let validation = RegistryValidator::validate_resident(&draft);
        if !validation.is_valid {
            return Err(RegistryError::validation_failed(validation.errors));
        }

        let resident = self.residents.create_resident(request).await?;
        info!(resident_id = %resident.id, kind = %resident.kind, "resident registered");
        Ok(Registration::Created(resident))
    }

    /// Stores an edited resident
    ///
    /// Derived payment figures are not refreshed here; billing owns them.
    #[instrument(skip(self, resident), fields(resident_id = %resident.id))]
    pub async fn update_resident(&self, mut resident: Resident) -> Result<Resident, RegistryError> {
        self.get_resident(resident.id).await?;
        self.get_guardian(resident.guardian_id).await?;

        let validation = RegistryValidator::validate_resident(&resident);
        if !validation.is_valid {
            return Err(RegistryError::validation_failed(validation.errors));
        }
        resident.apply_kind_rules();
        resident.updated_at = Utc::now();

        Ok(self.residents.update_resident(resident).await?)
    }

    pub async fn get_resident(&self, id: ResidentId) -> Result<Resident, RegistryError> {
        self.residents
            .get_resident(id)
            .await
            .map_err(|e| not_found_as(e, RegistryError::ResidentNotFound(id)))
    }

    pub async fn get_guardian(&self, id: GuardianId) -> Result<Guardian, RegistryError> {
        self.guardians
            .get_guardian(id)
            .await
            .map_err(|e| not_found_as(e, RegistryError::GuardianNotFound(id)))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_guardian(&self, id: GuardianId) -> Result<Guardian, RegistryError> {
        let mut guardian = self.get_guardian(id).await?;
        guardian.deactivate();
        Ok(self.guardians.update_guardian(guardian).await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_resident(&self, id: ResidentId) -> Result<Resident, RegistryError> {
        let mut resident = self.get_resident(id).await?;
        resident.deactivate();
        Ok(self.residents.update_resident(resident).await?)
    }

    /// Removes a guardian that no resident references
    #[instrument(skip(self))]
    pub async fn delete_guardian(&self, id: GuardianId) -> Result<(), RegistryError> {
        let guardian = self.get_guardian(id).await?;
        let dependants = self.residents.residents_of(id).await?;
        if !dependants.is_empty() {
            return Err(RegistryError::GuardianInUse {
                guardian_id: id,
                name: guardian.name,
                residents: dependants.len(),
            });
        }

        self.guardians.delete_guardian(id).await?;
        info!(guardian_id = %id, "guardian deleted");
        Ok(())
    }

    /// The guardian recorded as payer for a resident's payments
    pub async fn payer_of_record(&self, resident_id: ResidentId) -> Result<Guardian, RegistryError> {
        let resident = self.get_resident(resident_id).await?;
        let guardian = self.get_guardian(resident.guardian_id).await?;

        let validation = RegistryValidator::validate_as_payer(&guardian);
        if !guardian.has_document() {
            return Err(RegistryError::MissingPayerDocument {
                guardian_id: guardian.id,
                name: guardian.name,
            });
        }
        if !validation.is_valid {
            return Err(RegistryError::validation_failed(validation.errors));
        }
        for warning in &validation.warnings {
            warn!(guardian_id = %guardian.id, "{warning}");
        }
        Ok(guardian)
    }
}

fn not_found_as(error: PortError, replacement: RegistryError) -> RegistryError {
    if error.is_not_found() {
        replacement
    } else {
        RegistryError::Port(error)
    }
}
