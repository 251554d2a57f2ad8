//! Tenant-scoped patient resolution across the partner registry and the
//! local store.

use hospital_core::{Patient, SearchFilters};
use hospital_store::SqliteStore;
use std::sync::Arc;

use crate::error::Result;
use crate::registry::PatientRegistry;

pub struct IdentityResolver {
    store: Arc<SqliteStore>,
    registry: Arc<dyn PatientRegistry>,
}

impl IdentityResolver {
    pub fn new(store: Arc<SqliteStore>, registry: Arc<dyn PatientRegistry>) -> Self {
        Self { store, registry }
    }

    /// Find one patient by national id or passport id for `hospital_id`.
    ///
    /// A registry hit wins and is stamped with the caller's hospital.
    /// Otherwise only the caller's own local rows are searched.
    pub async fn resolve_by_id(&self, hospital_id: i64, id: &str) -> Result<Option<Patient>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        if let Some(patient) = self.lookup_registry(hospital_id, id).await {
            tracing::debug!(hospital_id, source = "registry", "Patient resolved");
            return Ok(Some(patient));
        }

        let local = self.store.find_patient_by_id(hospital_id, id)?;
        tracing::debug!(
            hospital_id,
            source = "store",
            found = local.is_some(),
            "Patient lookup finished"
        );
        Ok(local)
    }

    /// Search patients of `hospital_id` by field equality.
    ///
    /// When an identifier is present the registry is asked once; a hit is only
    /// used if it belongs to the caller after stamping.
    pub async fn resolve_by_filters(
        &self,
        hospital_id: i64,
        filters: &SearchFilters,
    ) -> Result<Vec<Patient>> {
        filters.require_non_empty()?;

        if let Some((field, id)) = filters.primary_identifier()
            && let Some(patient) = self.lookup_registry(hospital_id, id).await
            && patient.hospital_id == hospital_id
        {
            tracing::debug!(
                hospital_id,
                field = field.as_str(),
                source = "registry",
                "Patient search resolved"
            );
            return Ok(vec![patient]);
        }

        let patients = self.store.find_patients(hospital_id, filters)?;
        tracing::debug!(
            hospital_id,
            filters = filters.len(),
            source = "store",
            count = patients.len(),
            "Patient search finished"
        );
        Ok(patients)
    }

    async fn lookup_registry(&self, hospital_id: i64, id: &str) -> Option<Patient> {
        let mut patient = self.registry.lookup_by_id(id).await?;
        patient.hospital_id = hospital_id;
        Some(patient)
    }
}
