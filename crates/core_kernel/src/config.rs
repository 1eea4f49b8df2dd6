//! Engine configuration
//!
//! Loaded from the environment (prefix `CARE`), optionally seeded from a local
//! `.env` file. Every field has a default so an empty environment works.
//!
//! * `CARE_INSTITUTION_NAME` - used as the default backup context
//! * `CARE_BACKUP_CONTEXT` - `<context>` part of `backup_<context>_<date>.csv`
//! * `CARE_BACKUP_DIR` - directory backups are written to
//! * `CARE_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `CARE_AUTO_RESIDENT_BASE_FEE` - fee given to auto-created residents
//! * `CARE_AUTO_RESIDENT_BENEFIT_INCOME` - benefit given to auto-created residents

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::CoreError;
use crate::money::Money;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CareConfig {
    /// Institution display name
    pub institution_name: String,
    /// Context label embedded in backup file names
    pub backup_context: String,
    /// Directory where backups are written
    pub backup_dir: String,
    /// Log level
    pub log_level: String,
    /// Monthly fee assigned to residents created by the resolver
    pub auto_resident_base_fee: Decimal,
    /// Benefit income assigned to residents created by the resolver
    pub auto_resident_benefit_income: Decimal,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            institution_name: "instituicao".to_string(),
            backup_context: "instituicao".to_string(),
            backup_dir: "backups".to_string(),
            log_level: "info".to_string(),
            auto_resident_base_fee: Decimal::ZERO,
            auto_resident_benefit_income: Decimal::ZERO,
        }
    }
}

impl CareConfig {
    /// Loads configuration from the environment
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("CARE").try_parsing(true))
            .build()?
            .try_deserialize::<CareConfig>()?;
        Ok(config)
    }

    /// Fee for auto-created residents, normalized
    pub fn auto_resident_base_fee(&self) -> Money {
        Money::new(self.auto_resident_base_fee).non_negative()
    }

    /// Benefit for auto-created residents, normalized
    pub fn auto_resident_benefit_income(&self) -> Money {
        Money::new(self.auto_resident_benefit_income).non_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_conservative() {
        let config = CareConfig::default();
        assert!(config.auto_resident_base_fee().is_zero());
        assert!(config.auto_resident_benefit_income().is_zero());
        assert_eq!(config.log_level, "info");
    }
}
