//! Partner hospital registry lookups.
//!
//! The registry is a best-effort source: every failure is logged and turned
//! into `None` so callers fall back to the local store.

use async_trait::async_trait;
use hospital_core::Patient;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RegistrySettings;

/// A source of patient records keyed by national id or passport id.
#[async_trait]
pub trait PatientRegistry: Send + Sync {
    /// Look up one patient. `None` means "no data from this source".
    async fn lookup_by_id(&self, id: &str) -> Option<Patient>;
}

/// Build the registry described by `settings`.
pub fn from_settings(settings: &RegistrySettings) -> Arc<dyn PatientRegistry> {
    let Some(base_url) = settings.active_base_url() else {
        tracing::info!("External registry: disabled");
        return Arc::new(DisabledRegistry);
    };

    match HttpRegistryClient::new(base_url, settings.timeout()) {
        Ok(client) => {
            tracing::info!(
                base_url = %base_url,
                timeout_secs = settings.timeout().as_secs(),
                "External registry: enabled"
            );
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build registry client, registry disabled");
            Arc::new(DisabledRegistry)
        }
    }
}

/// Registry that never answers
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRegistry;

#[async_trait]
impl PatientRegistry for DisabledRegistry {
    async fn lookup_by_id(&self, _id: &str) -> Option<Patient> {
        None
    }
}

/// HTTP client for `GET {base_url}/patient/search/{id}`
pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn lookup_url(&self, id: &str) -> String {
        format!("{}/patient/search/{}", self.base_url, urlencoding::encode(id))
    }
}

#[async_trait]
impl PatientRegistry for HttpRegistryClient {
    async fn lookup_by_id(&self, id: &str) -> Option<Patient> {
        let url = self.lookup_url(id);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Registry request failed");
                return None;
            }
        };

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                tracing::debug!(url = %url, "Registry has no matching patient");
                return None;
            }
            status => {
                tracing::warn!(url = %url, status = %status, "Registry returned error status");
                return None;
            }
        }

        match response.json::<Patient>().await {
            Ok(patient) => Some(patient),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Registry returned unreadable patient");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode as AxumStatus, response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;

    /// Start a partner registry on a random port, returns its base url
    async fn start_partner() -> String {
        async fn search(Path(id): Path<String>) -> axum::response::Response {
            match id.as_str() {
                "1234567890123" => Json(json!({
                    "national_id": "1234567890123",
                    "passport_id": "P001",
                    "patient_hn": "HN001",
                    "first_name_en": "Somchai",
                    "last_name_en": "Jaidee",
                    "date_of_birth": "1990-01-15T00:00:00Z",
                    "gender": "M",
                    "hospital_id": "7"
                }))
                .into_response(),
                "A B/C" => Json(json!({
                    "passport_id": "A B/C",
                    "patient_hn": "HN900",
                    "gender": "F"
                }))
                .into_response(),
                "broken" => (AxumStatus::OK, "{not json").into_response(),
                "explode" => AxumStatus::INTERNAL_SERVER_ERROR.into_response(),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({ "national_id": "slow", "patient_hn": "HN901", "gender": "M" }))
                        .into_response()
                }
                _ => AxumStatus::NOT_FOUND.into_response(),
            }
        }

        let app = Router::new().route("/patient/search/{id}", get(search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> HttpRegistryClient {
        HttpRegistryClient::new(base_url, Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let base_url = start_partner().await;
        let patient = client(&base_url).lookup_by_id("1234567890123").await.unwrap();
        assert_eq!(patient.patient_hn, "HN001");
        assert_eq!(patient.first_name_en, "Somchai");
        assert_eq!(patient.hospital_id, 7);
        assert_eq!(
            patient.date_of_birth,
            chrono::NaiveDate::from_ymd_opt(1990, 1, 15)
        );
    }

    #[tokio::test]
    async fn test_lookup_encodes_id_as_one_segment() {
        let base_url = start_partner().await;
        let patient = client(&base_url).lookup_by_id("A B/C").await.unwrap();
        assert_eq!(patient.passport_id, "A B/C");
    }

    #[tokio::test]
    async fn test_lookup_degrades_to_none() {
        let base_url = start_partner().await;
        let registry = client(&format!("{base_url}/"));
        assert!(registry.lookup_by_id("0000000000000").await.is_none());
        assert!(registry.lookup_by_id("explode").await.is_none());
        assert!(registry.lookup_by_id("broken").await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_timeout() {
        let base_url = start_partner().await;
        let started = std::time::Instant::now();
        assert!(client(&base_url).lookup_by_id("slow").await.is_none());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_lookup_connection_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let registry = client(&format!("http://{}", addr));
        assert!(registry.lookup_by_id("1234567890123").await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_registry() {
        assert!(DisabledRegistry.lookup_by_id("1234567890123").await.is_none());

        let settings = RegistrySettings {
            enabled: false,
            ..RegistrySettings::default()
        };
        assert!(from_settings(&settings).lookup_by_id("1234567890123").await.is_none());
    }

    #[test]
    fn test_lookup_url() {
        let registry = client("http://partner.local/");
        assert_eq!(
            registry.lookup_url("P 01"),
            "http://partner.local/patient/search/P%2001"
        );
    }
}
