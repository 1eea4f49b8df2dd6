//! Shared helpers for the care ledger test suites
//!
//! `fixtures` holds fixed values and a small sample dataset, `builders`
//! assembles records with sensible defaults, `assertions` checks ledger
//! figures and `generators` supplies proptest strategies.

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
