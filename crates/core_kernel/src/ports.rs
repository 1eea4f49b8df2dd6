//! Port infrastructure
//!
//! The core never talks to storage directly. Each domain crate defines port
//! traits for its entities (`GuardianPort`, `PaymentPort`, ...) and receives
//! implementations by injection. This module holds what those traits share.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │   Services (resolver, payment upsert, backup) │
//! └───────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌───────────────────────────────────────────────┐
//! │  Port traits (list / get / create / insert /  │
//! │  update), one per entity, async, Send + Sync  │
//! └───────────────────────────────────────────────┘
//!            ▲                         ▲
//!   ┌────────┴────────┐      ┌────────┴─────────┐
//!   │ memory adapters │      │ real persistence │
//!   │ (tests, verify) │      │  collaborator    │
//!   └─────────────────┘      └──────────────────┘
//! ```

use std::fmt;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a storage adapter
#[derive(Debug, Error)]
pub enum PortError {
    /// No record of `entity` carries `id`
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    /// The adapter refused the record as given
    #[error("Rejected record: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The write would break a uniqueness rule (duplicate id, period taken)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The backing store itself failed
    #[error("Storage failure: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Wraps a driver error from a persistence adapter
    pub fn storage(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker trait for all domain ports
///
/// Port traits extend this marker so implementations can be shared behind
/// `Arc<dyn ...>` across async tasks.
pub trait DomainPort: Send + Sync + 'static {}
