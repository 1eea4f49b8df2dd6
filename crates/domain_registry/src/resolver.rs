//! Entity resolution
//!
//! Matches a name observed on a document (an invoice, a payment slip) to an
//! existing resident or guardian, and creates one when nothing matches.
//!
//! Matching runs on normalized names:
//!
//! 1. exact equality
//! 2. substring either way
//!
//! Ties within a step prefer the record whose document number carries the
//! same digits as the query, then active records, then the lowest id.
//! An empty normalized query never matches anything.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use validator::Validate;

use core_kernel::{normalize, same_document, CareConfig, GuardianId, Money};

use crate::error::RegistryError;
use crate::guardian::{Guardian, NewGuardian};
use crate::ports::{GuardianPort, ResidentPort};
use crate::resident::{NewResident, Resident, ResidentKind, AUTO_CREATED_NOTE};

/// Common view over the records the resolver can match
pub trait Named {
    fn id_value(&self) -> i64;
    fn display_name(&self) -> &str;
    fn document(&self) -> Option<&str>;
    fn is_active(&self) -> bool;
}

impl Named for Guardian {
    fn id_value(&self) -> i64 {
        self.id.value()
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn document(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Named for Resident {
    fn id_value(&self) -> i64 {
        self.id.value()
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn document(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// How a candidate was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Substring,
}

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Found { record: T, matched_by: MatchKind },
    NotFound,
}

impl<T> Resolution<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Resolution::Found { record, .. } => Some(record),
            Resolution::NotFound => None,
        }
    }
}

/// Picks the best candidate for `name` out of `candidates`
pub fn best_match<T: Named + Clone>(
    candidates: &[T],
    name: &str,
    document: Option<&str>,
) -> Resolution<T> {
    let query = normalize(name);
    if query.is_empty() {
        return Resolution::NotFound;
    }

    let keyed: Vec<(String, &T)> = candidates
        .iter()
        .map(|c| (normalize(c.display_name()), c))
        .collect();

    let exact: Vec<&T> = keyed
        .iter()
        .filter(|(key, _)| *key == query)
        .map(|(_, c)| *c)
        .collect();
    if let Some(record) = pick(&exact, document) {
        return Resolution::Found {
            record,
            matched_by: MatchKind::Exact,
        };
    }

    let partial: Vec<&T> = keyed
        .iter()
        .filter(|(key, _)| !key.is_empty() && (key.contains(&query) || query.contains(key.as_str())))
        .map(|(_, c)| *c)
        .collect();
    match pick(&partial, document) {
        Some(record) => Resolution::Found {
            record,
            matched_by: MatchKind::Substring,
        },
        None => Resolution::NotFound,
    }
}

fn pick<T: Named + Clone>(matches: &[&T], document: Option<&str>) -> Option<T> {
    matches
        .iter()
        .min_by_key(|c| {
            (
                !same_document(c.document(), document),
                !c.is_active(),
                c.id_value(),
            )
        })
        .map(|c| (*c).clone())
}

/// Records that look like the same person: exact normalized name or same
/// document digits. Each record appears once, ordered by id.
pub fn find_duplicates<T: Named + Clone>(
    candidates: &[T],
    name: &str,
    document: Option<&str>,
) -> Vec<T> {
    let query = normalize(name);
    let mut found: Vec<T> = candidates
        .iter()
        .filter(|c| {
            let same_name = !query.is_empty() && normalize(c.display_name()) == query;
            same_name || same_document(c.document(), document)
        })
        .cloned()
        .collect();
    found.sort_by_key(|c| c.id_value());
    found.dedup_by_key(|c| c.id_value());
    found
}

/// Amounts given to residents created without operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoCreateDefaults {
    pub base_fee: Money,
    pub benefit_income: Money,
}

impl AutoCreateDefaults {
    pub fn from_config(config: &CareConfig) -> Self {
        Self {
            base_fee: config.auto_resident_base_fee(),
            benefit_income: config.auto_resident_benefit_income(),
        }
    }
}

/// A resident together with its guardian, as returned by
/// [`EntityResolver::resolve_or_create_pair`]
#[derive(Debug, Clone)]
pub struct ResolvedPair {
    pub guardian: Guardian,
    pub resident: Resident,
    pub guardian_created: bool,
    pub resident_created: bool,
}

/// Resolves observed names against the registry
#[derive(Clone)]
pub struct EntityResolver {
    guardians: Arc<dyn GuardianPort>,
    residents: Arc<dyn ResidentPort>,
    defaults: AutoCreateDefaults,
}

impl EntityResolver {
    pub fn new(
        guardians: Arc<dyn GuardianPort>,
        residents: Arc<dyn ResidentPort>,
        defaults: AutoCreateDefaults,
    ) -> Self {
        Self {
            guardians,
            residents,
            defaults,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve_resident(
        &self,
        name: &str,
        document: Option<&str>,
    ) -> Result<Resolution<Resident>, RegistryError> {
        let residents = self.residents.list_residents().await?;
        let resolution = best_match(&residents, name, document);
        if let Resolution::Found { record, matched_by } = &resolution {
            debug!(resident_id = %record.id, ?matched_by, "resident resolved");
        }
        Ok(resolution)
    }

    #[instrument(skip(self))]
    pub async fn resolve_guardian(
        &self,
        name: &str,
        document: Option<&str>,
    ) -> Result<Resolution<Guardian>, RegistryError> {
        let guardians = self.guardians.list_guardians().await?;
        let resolution = best_match(&guardians, name, document);
        if let Resolution::Found { record, matched_by } = &resolution {
            debug!(guardian_id = %record.id, ?matched_by, "guardian resolved");
        }
        Ok(resolution)
    }

    /// Creates an active REGULAR resident tagged as auto-created
    #[instrument(skip(self))]
    pub async fn create_resident_auto(
        &self,
        name: &str,
        document: Option<&str>,
        guardian_id: GuardianId,
    ) -> Result<Resident, RegistryError> {
        if !self.guardians.guardian_exists(guardian_id).await? {
            return Err(RegistryError::GuardianNotFound(guardian_id));
        }

        let request = NewResident {
            document_number: document.map(str::to_string),
            notes: Some(AUTO_CREATED_NOTE.to_string()),
            ..NewResident::new(name.trim(), guardian_id)
                .with_kind(ResidentKind::Regular)
                .with_fee(self.defaults.base_fee)
                .with_benefit(self.defaults.benefit_income)
        };
        request.validate()?;

        let resident = self.residents.create_resident(request).await?;
        info!(resident_id = %resident.id, guardian_id = %guardian_id, name = %resident.name, "resident auto-created");
        Ok(resident)
    }

    #[instrument(skip(self))]
    pub async fn create_guardian_auto(
        &self,
        name: &str,
        document: Option<&str>,
    ) -> Result<Guardian, RegistryError> {
        let request = NewGuardian {
            document_number: document.map(str::to_string),
            ..NewGuardian::named(name.trim())
        };
        request.validate()?;

        let guardian = self.guardians.create_guardian(request).await?;
        info!(guardian_id = %guardian.id, name = %guardian.name, "guardian auto-created");
        Ok(guardian)
    }

    /// Resolves a resident and its guardian, creating whatever is missing
    ///
    /// An existing resident keeps its recorded guardian even when the
    /// document names someone else. A new resident needs `guardian_name`.
    #[instrument(skip(self))]
    pub async fn resolve_or_create_pair(
        &self,
        resident_name: &str,
        resident_document: Option<&str>,
        guardian_name: Option<&str>,
        guardian_document: Option<&str>,
    ) -> Result<ResolvedPair, RegistryError> {
        if normalize(resident_name).is_empty() {
            return Err(RegistryError::Validation(format!(
                "resident name '{resident_name}' is empty after normalization"
            )));
        }

        if let Some(resident) = self
            .resolve_resident(resident_name, resident_document)
            .await?
            .into_option()
        {
            let guardian = self
                .guardians
                .get_guardian(resident.guardian_id)
                .await
                .map_err(|e| match e.is_not_found() {
                    true => RegistryError::GuardianNotFound(resident.guardian_id),
                    false => RegistryError::Port(e),
                })?;
            return Ok(ResolvedPair {
                guardian,
                resident,
                guardian_created: false,
                resident_created: false,
            });
        }

        let guardian_name = guardian_name
            .filter(|n| !normalize(n).is_empty())
            .ok_or_else(|| RegistryError::GuardianRequired {
                resident_name: resident_name.trim().to_string(),
            })?;

        let (guardian, guardian_created) = match self
            .resolve_guardian(guardian_name, guardian_document)
            .await?
            .into_option()
        {
            Some(guardian) => (guardian, false),
            None => (
                self.create_guardian_auto(guardian_name, guardian_document).await?,
                true,
            ),
        };

        let resident = self
            .create_resident_auto(resident_name, resident_document, guardian.id)
            .await?;

        Ok(ResolvedPair {
            guardian,
            resident,
            guardian_created,
            resident_created: true,
        })
    }

    pub async fn find_resident_duplicates(
        &self,
        name: &str,
        document: Option<&str>,
    ) -> Result<Vec<Resident>, RegistryError> {
        let residents = self.residents.list_residents().await?;
        Ok(find_duplicates(&residents, name, document))
    }

    pub async fn find_guardian_duplicates(
        &self,
        name: &str,
        document: Option<&str>,
    ) -> Result<Vec<Guardian>, RegistryError> {
        let guardians = self.guardians.list_guardians().await?;
        Ok(find_duplicates(&guardians, name, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ResidentId;

    fn resident(id: i64, name: &str, document: Option<&str>, active: bool) -> Resident {
        let mut request = NewResident::new(name, GuardianId::new(1));
        request.document_number = document.map(str::to_string);
        let mut resident = Resident::from_request(ResidentId::new(id), request);
        resident.active = active;
        resident
    }

    #[test]
    fn test_exact_match_beats_substring() {
        let candidates = vec![
            resident(1, "Maria Santos Oliveira", None, true),
            resident(2, "Maria Santos", None, true),
        ];
        match best_match(&candidates, "MARIA SANTOS", None) {
            Resolution::Found { record, matched_by } => {
                assert_eq!(record.id, ResidentId::new(2));
                assert_eq!(matched_by, MatchKind::Exact);
            }
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn test_substring_matches_either_way() {
        let candidates = vec![resident(1, "José da Silva", None, true)];
        assert!(best_match(&candidates, "jose", None).is_found());
        assert!(best_match(&candidates, "Sr. José da Silva Filho", None).is_found());
        assert!(!best_match(&candidates, "Antonio", None).is_found());
    }

    #[test]
    fn test_empty_query_never_matches() {
        let candidates = vec![resident(1, "Ana", None, true)];
        assert!(!best_match(&candidates, "", None).is_found());
        assert!(!best_match(&candidates, " -- ", None).is_found());
    }

    #[test]
    fn test_tie_break_document_then_active_then_id() {
        let candidates = vec![
            resident(1, "Ana Lima", None, false),
            resident(2, "Ana Lima", None, true),
            resident(3, "Ana Lima", Some("111.222.333-44"), false),
        ];
        let by_doc = best_match(&candidates, "Ana Lima", Some("11122233344")).into_option();
        assert_eq!(by_doc.unwrap().id, ResidentId::new(3));

        let by_active = best_match(&candidates, "Ana Lima", None).into_option();
        assert_eq!(by_active.unwrap().id, ResidentId::new(2));
    }

    #[test]
    fn test_duplicates_union_without_repeats() {
        let candidates = vec![
            resident(3, "Ana Lima", Some("123"), true),
            resident(1, "Outra Pessoa", Some("1-2-3"), true),
            resident(2, "Pedro", None, true),
        ];
        let found = find_duplicates(&candidates, "ana lima", Some("123"));
        let ids: Vec<i64> = found.iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
