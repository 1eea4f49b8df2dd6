//! Core Kernel - Foundational types for the care ledger
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Money with two-decimal, round-half-away-from-zero normalization
//! - Integer identifiers and reference periods
//! - The name normalizer used for matching
//! - Port infrastructure, the settings port, and engine configuration

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod text;
pub mod error;
pub mod ports;
pub mod settings;
pub mod config;

pub use money::{Money, MoneyError, round_money, round_money_f64, percent_of, positive_difference};
pub use temporal::{ReferencePeriod, TemporalError};
pub use identifiers::{GuardianId, ResidentId, PaymentId, InvoiceId};
pub use text::{normalize, digits_only, same_document};
pub use error::CoreError;
pub use ports::{PortError, DomainPort};
pub use settings::{Setting, SettingsPort};
pub use config::CareConfig;
