//! Strongly-typed identifiers for domain entities
//!
//! Records are keyed by integer ids assigned by the persistence collaborator
//! (or carried over verbatim from a backup file). Newtype wrappers keep a
//! resident id from being passed where a guardian id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw id
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw id
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns the id following this one
            pub const fn next(&self) -> Self {
                Self(self.0 + 1)
            }

            /// Entity label used in logs and error messages
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(GuardianId, "Guardian");
define_id!(ResidentId, "Resident");
define_id!(PaymentId, "Payment");
define_id!(InvoiceId, "Invoice");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_raw_number() {
        assert_eq!(ResidentId::new(42).to_string(), "42");
    }

    #[test]
    fn test_id_parsing_trims() {
        let parsed: GuardianId = " 7 ".parse().unwrap();
        assert_eq!(parsed, GuardianId::new(7));
        assert!("x1".parse::<GuardianId>().is_err());
    }

    #[test]
    fn test_next() {
        assert_eq!(PaymentId::new(9).next(), PaymentId::new(10));
    }
}
