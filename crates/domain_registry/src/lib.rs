//! Resident Registry Domain
//!
//! This crate manages the people a care facility bills: residents and the
//! guardians responsible for them.
//!
//! # Record Model
//!
//! - **Guardian**: legally and financially responsible party; needs a
//!   document number before it can be the payer of record
//! - **Resident**: the billable subject, always linked to one guardian,
//!   either REGULAR (70% rule with donation) or SOCIAL (fee equals benefit)
//!
//! Names arriving from outside (invoices, payment slips) are matched against
//! the registry by the [`EntityResolver`], which can also create the missing
//! records.
//!
//! # Examples
//!
//! ```rust
//! use domain_registry::{find_duplicates, Guardian, NewGuardian};
//! use core_kernel::GuardianId;
//!
//! let existing = vec![Guardian::from_request(
//!     GuardianId::new(1),
//!     NewGuardian::named("Antônio Pereira").with_document("123.456.789-00"),
//! )];
//!
//! let candidates = find_duplicates(&existing, "antonio pereira", None);
//! assert_eq!(candidates.len(), 1);
//! ```

pub mod guardian;
pub mod resident;
pub mod error;
pub mod validation;
pub mod ports;
pub mod resolver;
pub mod service;

pub use guardian::{Guardian, NewGuardian};
pub use resident::{NewResident, Resident, ResidentKind, AUTO_CREATED_NOTE, AUTO_CREATED_TAG};
pub use error::RegistryError;
pub use validation::{RegistryValidator, ValidationResult};
pub use ports::{GuardianPort, ResidentPort};
#[cfg(any(test, feature = "memory"))]
pub use ports::memory::{InMemoryGuardianPort, InMemoryResidentPort};
pub use resolver::{
    best_match, find_duplicates, AutoCreateDefaults, EntityResolver, MatchKind, Named,
    Resolution, ResolvedPair,
};
pub use service::{DuplicatePolicy, Registration, RegistryService};
