//! Patient search filters.
//!
//! Callers send a flat `field -> value` map. Only the fields listed in
//! [`SearchField`] are accepted, and each maps to a fixed column name.

use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchField {
    NationalId,
    PassportId,
    PatientHn,
    FirstNameTh,
    MiddleNameTh,
    LastNameTh,
    FirstNameEn,
    MiddleNameEn,
    LastNameEn,
    DateOfBirth,
    PhoneNumber,
    Email,
    Gender,
}

impl SearchField {
    pub const ALL: [SearchField; 13] = [
        SearchField::NationalId,
        SearchField::PassportId,
        SearchField::PatientHn,
        SearchField::FirstNameTh,
        SearchField::MiddleNameTh,
        SearchField::LastNameTh,
        SearchField::FirstNameEn,
        SearchField::MiddleNameEn,
        SearchField::LastNameEn,
        SearchField::DateOfBirth,
        SearchField::PhoneNumber,
        SearchField::Email,
        SearchField::Gender,
    ];

    /// Request key, which is also the column name in the `patients` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::NationalId => "national_id",
            SearchField::PassportId => "passport_id",
            SearchField::PatientHn => "patient_hn",
            SearchField::FirstNameTh => "first_name_th",
            SearchField::MiddleNameTh => "middle_name_th",
            SearchField::LastNameTh => "last_name_th",
            SearchField::FirstNameEn => "first_name_en",
            SearchField::MiddleNameEn => "middle_name_en",
            SearchField::LastNameEn => "last_name_en",
            SearchField::DateOfBirth => "date_of_birth",
            SearchField::PhoneNumber => "phone_number",
            SearchField::Email => "email",
            SearchField::Gender => "gender",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    /// Identifier fields may be resolved through the partner registry.
    pub fn is_identifier(&self) -> bool {
        matches!(self, SearchField::NationalId | SearchField::PassportId)
    }
}

/// Validated, non-empty equality predicates for a patient search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    fields: BTreeMap<SearchField, String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build filters from a raw request map.
    ///
    /// Unknown keys are rejected. Blank values are dropped.
    pub fn from_map(raw: &HashMap<String, String>) -> Result<Self> {
        let mut filters = Self::new();
        for (key, value) in raw {
            let field = SearchField::parse(key.trim()).ok_or_else(|| CoreError::UnknownFilter {
                field: key.clone(),
            })?;
            filters = filters.with(field, value);
        }
        Ok(filters)
    }

    /// Add a predicate. Whitespace-only values are ignored.
    pub fn with(mut self, field: SearchField, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.fields.insert(field, value.to_string());
        }
        self
    }

    pub fn get(&self, field: SearchField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SearchField, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// The first identifier to try against the registry: `national_id`, then `passport_id`.
    pub fn primary_identifier(&self) -> Option<(SearchField, &str)> {
        [SearchField::NationalId, SearchField::PassportId]
            .into_iter()
            .find_map(|f| self.get(f).map(|v| (f, v)))
    }

    /// Reject a filter set that would list the whole tenant.
    pub fn require_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CoreError::EmptyFilter);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_field_names_roundtrip() {
        for field in SearchField::ALL {
            assert_eq!(SearchField::parse(field.as_str()), Some(field));
        }
        assert_eq!(SearchField::parse("hospital_id"), None);
    }

    #[test]
    fn test_from_map_drops_blank_values() {
        let filters = SearchFilters::from_map(&raw(&[
            ("first_name_th", "สมชาย"),
            ("last_name_th", ""),
            ("email", "   "),
        ]))
        .unwrap();

        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get(SearchField::FirstNameTh), Some("สมชาย"));
        assert_eq!(filters.get(SearchField::LastNameTh), None);
    }

    #[test]
    fn test_from_map_rejects_unknown_key() {
        let err = SearchFilters::from_map(&raw(&[("hospital_id", "2")])).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownFilter {
                field: "hospital_id".to_string()
            }
        );

        let err = SearchFilters::from_map(&raw(&[("national_id = '' OR 1=1 --", "x")]));
        assert!(matches!(err, Err(CoreError::UnknownFilter { .. })));
    }

    #[test]
    fn test_primary_identifier_prefers_national_id() {
        let filters = SearchFilters::new()
            .with(SearchField::PassportId, "P001")
            .with(SearchField::NationalId, "1234567890123");
        assert_eq!(
            filters.primary_identifier(),
            Some((SearchField::NationalId, "1234567890123"))
        );

        let filters = SearchFilters::new()
            .with(SearchField::NationalId, " ")
            .with(SearchField::PassportId, "P001");
        assert_eq!(
            filters.primary_identifier(),
            Some((SearchField::PassportId, "P001"))
        );

        let filters = SearchFilters::new().with(SearchField::Email, "a@b.c");
        assert_eq!(filters.primary_identifier(), None);
    }

    #[test]
    fn test_require_non_empty() {
        assert_eq!(
            SearchFilters::new().require_non_empty(),
            Err(CoreError::EmptyFilter)
        );
        let empty_values = SearchFilters::from_map(&raw(&[("national_id", "")])).unwrap();
        assert!(empty_values.require_non_empty().is_err());
        assert!(
            SearchFilters::new()
                .with(SearchField::PatientHn, "HN001")
                .require_non_empty()
                .is_ok()
        );
    }

    #[test]
    fn test_identifier_fields() {
        assert!(SearchField::NationalId.is_identifier());
        assert!(SearchField::PassportId.is_identifier());
        assert!(!SearchField::PatientHn.is_identifier());
    }
}
