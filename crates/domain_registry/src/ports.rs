//! Registry Domain Ports
//!
//! Storage interfaces for guardians and residents. The persistence
//! collaborator implements these; the core depends on nothing else.
//!
//! - `create_*` lets the port assign the next id (interactive and
//!   auto-create paths)
//! - `insert_*` keeps the id carried by the record (restore path) and fails
//!   with `PortError::Conflict` if it is taken
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_registry::ports::{GuardianPort, ResidentPort};
//! use std::sync::Arc;
//!
//! let guardians: Arc<dyn GuardianPort> = Arc::new(InMemoryGuardianPort::new());
//! let residents: Arc<dyn ResidentPort> = Arc::new(InMemoryResidentPort::new());
//! let resolver = EntityResolver::new(guardians, residents, AutoCreateDefaults::default());
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, GuardianId, PortError, ResidentId};

use crate::guardian::{Guardian, NewGuardian};
use crate::resident::{NewResident, Resident};

/// Storage port for guardians
#[async_trait]
pub trait GuardianPort: DomainPort {
    /// Lists every guardian, ordered by id
    async fn list_guardians(&self) -> Result<Vec<Guardian>, PortError>;

    /// Retrieves a guardian, or `PortError::NotFound`
    async fn get_guardian(&self, id: GuardianId) -> Result<Guardian, PortError>;

    /// Creates a guardian with a freshly assigned id
    async fn create_guardian(&self, request: NewGuardian) -> Result<Guardian, PortError>;

    /// Stores a guardian under its own id
    async fn insert_guardian(&self, guardian: Guardian) -> Result<Guardian, PortError>;

    /// Replaces an existing guardian
    async fn update_guardian(&self, guardian: Guardian) -> Result<Guardian, PortError>;

    /// Physically removes a guardian
    async fn delete_guardian(&self, id: GuardianId) -> Result<(), PortError>;

    /// Checks if a guardian exists
    async fn guardian_exists(&self, id: GuardianId) -> Result<bool, PortError> {
        match self.get_guardian(id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Storage port for residents
#[async_trait]
pub trait ResidentPort: DomainPort {
    /// Lists every resident, ordered by id
    async fn list_residents(&self) -> Result<Vec<Resident>, PortError>;

    /// Retrieves a resident, or `PortError::NotFound`
    async fn get_resident(&self, id: ResidentId) -> Result<Resident, PortError>;

    /// Creates a resident with a freshly assigned id
    async fn create_resident(&self, request: NewResident) -> Result<Resident, PortError>;

    /// Stores a resident under its own id
    async fn insert_resident(&self, resident: Resident) -> Result<Resident, PortError>;

    /// Replaces an existing resident
    async fn update_resident(&self, resident: Resident) -> Result<Resident, PortError>;

    /// Checks if a resident exists
    async fn resident_exists(&self, id: ResidentId) -> Result<bool, PortError> {
        match self.get_resident(id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Residents whose guardian is `guardian_id`
    async fn residents_of(&self, guardian_id: GuardianId) -> Result<Vec<Resident>, PortError> {
        Ok(self
            .list_residents()
            .await?
            .into_iter()
            .filter(|r| r.guardian_id == guardian_id)
            .collect())
    }
}

/// In-memory implementations of the registry ports
///
/// Ids are assigned as `max(existing) + 1`, so records restored with their
/// original ids never collide with later creations.
#[cfg(any(test, feature = "memory"))]
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory guardian store
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryGuardianPort {
        guardians: Arc<RwLock<BTreeMap<GuardianId, Guardian>>>,
    }

    impl InMemoryGuardianPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with guardians for testing
        pub async fn with_guardians(guardians: Vec<Guardian>) -> Self {
            let port = Self::new();
            {
                let mut map = port.guardians.write().await;
                for guardian in guardians {
                    map.insert(guardian.id, guardian);
                }
            }
            port
        }
    }

    impl DomainPort for InMemoryGuardianPort {}

    #[async_trait]
    impl GuardianPort for InMemoryGuardianPort {
        async fn list_guardians(&self) -> Result<Vec<Guardian>, PortError> {
            Ok(self.guardians.read().await.values().cloned().collect())
        }

        async fn get_guardian(&self, id: GuardianId) -> Result<Guardian, PortError> {
            self.guardians
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found(GuardianId::label(), id))
        }

        async fn create_guardian(&self, request: NewGuardian) -> Result<Guardian, PortError> {
            let mut guardians = self.guardians.write().await;
            let id = guardians
                .keys()
                .next_back()
                .map(GuardianId::next)
                .unwrap_or(GuardianId::new(1));
            let guardian = Guardian::from_request(id, request);
            guardians.insert(id, guardian.clone());
            Ok(guardian)
        }

        async fn insert_guardian(&self, guardian: Guardian) -> Result<Guardian, PortError> {
            let mut guardians = self.guardians.write().await;
            if guardians.contains_key(&guardian.id) {
                return Err(PortError::conflict(format!(
                    "Guardian {} already exists",
                    guardian.id
                )));
            }
            guardians.insert(guardian.id, guardian.clone());
            Ok(guardian)
        }

        async fn update_guardian(&self, guardian: Guardian) -> Result<Guardian, PortError> {
            let mut guardians = self.guardians.write().await;
            let slot = guardians
                .get_mut(&guardian.id)
                .ok_or_else(|| PortError::not_found(GuardianId::label(), guardian.id))?;
            *slot = guardian.clone();
            Ok(guardian)
        }

        async fn delete_guardian(&self, id: GuardianId) -> Result<(), PortError> {
            self.guardians
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found(GuardianId::label(), id))
        }
    }

    /// In-memory resident store
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryResidentPort {
        residents: Arc<RwLock<BTreeMap<ResidentId, Resident>>>,
    }

    impl InMemoryResidentPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with residents for testing
        pub async fn with_residents(residents: Vec<Resident>) -> Self {
            let port = Self::new();
            {
                let mut map = port.residents.write().await;
                for resident in residents {
                    map.insert(resident.id, resident);
                }
            }
            port
        }
    }

    impl DomainPort for InMemoryResidentPort {}

    #[async_trait]
    impl ResidentPort for InMemoryResidentPort {
        async fn list_residents(&self) -> Result<Vec<Resident>, PortError> {
            Ok(self.residents.read().await.values().cloned().collect())
        }

        async fn get_resident(&self, id: ResidentId) -> Result<Resident, PortError> {
            self.residents
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found(ResidentId::label(), id))
        }

        async fn create_resident(&self, request: NewResident) -> Result<Resident, PortError> {
            let mut residents = self.residents.write().await;
            let id = residents
                .keys()
                .next_back()
                .map(ResidentId::next)
                .unwrap_or(ResidentId::new(1));
            let resident = Resident::from_request(id, request);
            residents.insert(id, resident.clone());
            Ok(resident)
        }

        async fn insert_resident(&self, resident: Resident) -> Result<Resident, PortError> {
            let mut residents = self.residents.write().await;
            if residents.contains_key(&resident.id) {
                return Err(PortError::conflict(format!(
                    "Resident {} already exists",
                    resident.id
                )));
            }
            residents.insert(resident.id, resident.clone());
            Ok(resident)
        }

        async fn update_resident(&self, resident: Resident) -> Result<Resident, PortError> {
            let mut residents = self.residents.write().await;
            let slot = residents
                .get_mut(&resident.id)
                .ok_or_else(|| PortError::not_found(ResidentId::label(), resident.id))?;
            *slot = resident.clone();
            Ok(resident)
        }
    }
}
