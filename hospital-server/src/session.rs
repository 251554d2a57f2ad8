//! Staff login and hospital-scoped claims.
//!
//! Passwords are stored as argon2 PHC strings. A successful login yields an
//! HS256 JWT carrying the staff id and the one hospital the staff belongs to.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use hospital_core::{CoreError, Staff};
use hospital_store::{SqliteStore, StoreError};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AuthSettings;
use crate::error::{Result, ServiceError};

/// Claims carried by a staff token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub staff_id: i64,
    pub hospital_id: i64,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub sub: String,
}

/// Signs and verifies staff tokens
pub struct ClaimsIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl ClaimsIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_issuer(&[&settings.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation,
            issuer: settings.issuer.clone(),
            ttl: settings.token_ttl(),
        }
    }

    /// Mint a token for one staff member in one hospital.
    pub fn issue_claim(&self, staff_id: i64, hospital_id: i64) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            staff_id,
            hospital_id,
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl),
            iss: self.issuer.clone(),
            sub: format!("staff:{staff_id}"),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify signature, algorithm, issuer and expiry, then return the claims.
    pub fn verify_claim(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::InvalidToken(e.to_string()))
    }
}

/// Hash a password into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Hashing(e.to_string()))
}

/// Check a password against a stored hash. A mismatch is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| ServiceError::Hashing(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ServiceError::Hashing(e.to_string())),
    }
}

/// Staff account operations: creation, login, token verification
pub struct SessionService {
    store: Arc<SqliteStore>,
    issuer: ClaimsIssuer,
}

/// Verified for unknown usernames so both failure paths cost the same.
/// Uses the same argon2id parameters as `Argon2::default()`.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$bGxFO4AJA9jwqs2jBhba+g$9vIieDT6b7NkUivwfAsKz/a2VPDiWLDRuQySYmklHoM";

/// Usernames are compared trimmed on every path.
fn normalize_username(username: &str) -> &str {
    username.trim()
}

impl SessionService {
    pub fn new(store: Arc<SqliteStore>, settings: &AuthSettings) -> Self {
        Self {
            store,
            issuer: ClaimsIssuer::new(settings),
        }
    }

    pub fn issuer(&self) -> &ClaimsIssuer {
        &self.issuer
    }

    /// Check a username/password pair.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Staff> {
        let username = normalize_username(username);
        let Some(staff) = self.store.find_staff_by_username(username)? else {
            let _ = verify_password(password, DUMMY_HASH);
            return Err(ServiceError::InvalidCredentials);
        };

        let matches = verify_password(password, &staff.password_hash).unwrap_or_else(|e| {
            tracing::warn!(staff_id = staff.id, error = %e, "Stored password hash is unreadable");
            false
        });

        if matches {
            Ok(staff)
        } else {
            Err(ServiceError::InvalidCredentials)
        }
    }

    /// Authenticate and mint a token scoped to the staff's hospital.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        let staff = self.authenticate(username, password)?;
        let token = self.issuer.issue_claim(staff.id, staff.hospital_id)?;
        tracing::info!(staff_id = staff.id, hospital_id = staff.hospital_id, "Staff logged in");
        Ok(token)
    }

    /// Create a staff account under the hospital with the given name.
    pub fn create_staff(&self, username: &str, password: &str, hospital_name: &str) -> Result<Staff> {
        let username = normalize_username(username);
        let hospital_name = hospital_name.trim();
        if username.is_empty() || password.is_empty() || hospital_name.is_empty() {
            return Err(CoreError::validation(
                "username, password and hospital_name are required",
            )
            .into());
        }

        let hospital = self
            .store
            .find_hospital_by_name(hospital_name)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "hospital",
                key: hospital_name.to_string(),
            })?;

        let password_hash = hash_password(password)?;
        let staff = self.store.create_staff(username, &password_hash, hospital.id)?;

        tracing::info!(
            staff_id = staff.id,
            hospital_id = hospital.id,
            username = %staff.username,
            "Staff created"
        );
        Ok(staff)
    }

    /// Verify a token and confirm the staff still belongs to the claimed hospital.
    pub fn verify_session(&self, token: &str) -> Result<Claims> {
        let claims = self.issuer.verify_claim(token)?;
        match self.store.find_staff_by_id(claims.staff_id)? {
            Some(staff) if staff.hospital_id == claims.hospital_id => Ok(claims),
            _ => Err(ServiceError::InvalidToken(
                "staff no longer belongs to claimed hospital".to_string(),
            )),
        }
    }
}
