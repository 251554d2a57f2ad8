//! SQLite-based credential store
//!
//! Schema:
//!   - hospitals: tenants, unique by name
//!   - staff: accounts, each owned by one hospital
//!   - patients: records, each owned by one hospital. Empty identifiers are
//!     stored as NULL so the UNIQUE constraints only apply to real values.

use crate::error::{Result, StoreError};
use hospital_core::model::date_of_birth;
use hospital_core::{Gender, Hospital, Patient, SearchField, SearchFilters, Staff};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const PATIENT_COLUMNS: &str = "national_id, passport_id, patient_hn, \
    first_name_th, middle_name_th, last_name_th, \
    first_name_en, middle_name_en, last_name_en, \
    date_of_birth, phone_number, email, gender, hospital_id";

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub hospitals: i64,
    pub staff: i64,
    pub patients: i64,
}

/// One hospital with its staff and patients, inserted together by
/// [`SqliteStore::seed_if_empty`]. Patient `hospital_id`s are filled in.
#[derive(Debug, Clone, Default)]
pub struct TenantSeed {
    pub name: String,
    /// `(username, password_hash)`
    pub staff: Vec<(String, String)>,
    pub patients: Vec<Patient>,
}

/// SQLite-based store for hospitals, staff and patients
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

#[allow(clippy::result_large_err)]
impl SqliteStore {
    /// Open the store (create if not exists)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL for read-write concurrency; foreign keys are off by default in SQLite
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS hospitals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS staff (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                hospital_id INTEGER NOT NULL REFERENCES hospitals(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS patients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                national_id TEXT UNIQUE,
                passport_id TEXT UNIQUE,
                patient_hn TEXT NOT NULL UNIQUE,
                first_name_th TEXT NOT NULL DEFAULT '',
                middle_name_th TEXT NOT NULL DEFAULT '',
                last_name_th TEXT NOT NULL DEFAULT '',
                first_name_en TEXT NOT NULL DEFAULT '',
                middle_name_en TEXT NOT NULL DEFAULT '',
                last_name_en TEXT NOT NULL DEFAULT '',
                date_of_birth TEXT,
                phone_number TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                gender TEXT NOT NULL CHECK (gender IN ('M', 'F')),
                hospital_id INTEGER NOT NULL REFERENCES hospitals(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_staff_hospital ON staff(hospital_id);
            CREATE INDEX IF NOT EXISTS idx_patients_hospital ON patients(hospital_id);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("store connection lock poisoned".to_string()))
    }

    // --- hospitals ---

    /// Create a hospital
    pub fn create_hospital(&self, name: &str) -> Result<Hospital> {
        let conn = self.conn()?;
        Ok(Hospital {
            id: insert_hospital(&conn, name)?,
            name: name.to_string(),
        })
    }

    /// Look up a hospital by its unique name
    pub fn find_hospital_by_name(&self, name: &str) -> Result<Option<Hospital>> {
        let conn = self.conn()?;
        let hospital = conn
            .query_row(
                "SELECT id, name FROM hospitals WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Hospital {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(hospital)
    }

    pub fn find_hospital_by_id(&self, id: i64) -> Result<Option<Hospital>> {
        let conn = self.conn()?;
        let hospital = conn
            .query_row(
                "SELECT id, name FROM hospitals WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Hospital {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(hospital)
    }

    // --- staff ---

    /// Create a staff account under an existing hospital
    pub fn create_staff(&self, username: &str, password_hash: &str, hospital_id: i64) -> Result<Staff> {
        let conn = self.conn()?;
        Ok(Staff {
            id: insert_staff(&conn, username, password_hash, hospital_id)?,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            hospital_id,
        })
    }

    pub fn find_staff_by_username(&self, username: &str) -> Result<Option<Staff>> {
        let conn = self.conn()?;
        let staff = conn
            .query_row(
                "SELECT id, username, password_hash, hospital_id FROM staff WHERE username = ?1",
                params![username],
                staff_from_row,
            )
            .optional()?;
        Ok(staff)
    }

    pub fn find_staff_by_id(&self, id: i64) -> Result<Option<Staff>> {
        let conn = self.conn()?;
        let staff = conn
            .query_row(
                "SELECT id, username, password_hash, hospital_id FROM staff WHERE id = ?1",
                params![id],
                staff_from_row,
            )
            .optional()?;
        Ok(staff)
    }

    // --- patients ---

    /// Insert a patient record. Returns the row id.
    pub fn create_patient(&self, patient: &Patient) -> Result<i64> {
        let conn = self.conn()?;
        insert_patient(&conn, patient)
    }

    /// Find a tenant's patient by national ID or passport ID.
    pub fn find_patient_by_id(&self, hospital_id: i64, id: &str) -> Result<Option<Patient>> {
        let conn = self.conn()?;
        let patient = conn
            .query_row(
                &format!(
                    "SELECT {PATIENT_COLUMNS} FROM patients \
                     WHERE hospital_id = ?1 AND (national_id = ?2 OR passport_id = ?2) \
                     ORDER BY id LIMIT 1"
                ),
                params![hospital_id, id],
                patient_from_row,
            )
            .optional()?;
        Ok(patient)
    }

    /// Find a tenant's patients matching every filter (AND). No filters lists the tenant.
    pub fn find_patients(&self, hospital_id: i64, filters: &SearchFilters) -> Result<Vec<Patient>> {
        let mut sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE hospital_id = ?");
        let mut values = vec![Value::Integer(hospital_id)];

        for (field, value) in filters.iter() {
            // Column names come from SearchField, never from the request
            sql.push_str(" AND ");
            sql.push_str(field.as_str());
            sql.push_str(" = ?");
            values.push(Value::Text(normalize_filter_value(field, value)));
        }
        sql.push_str(" ORDER BY patient_hn");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), patient_from_row)?;

        let mut patients = Vec::new();
        for patient in rows {
            patients.push(patient?);
        }

        Ok(patients)
    }

    /// Insert every tenant in one transaction, only if there are no hospitals yet.
    ///
    /// Returns `false` when data already exists. A failure rolls back every row.
    pub fn seed_if_empty(&self, tenants: &[TenantSeed]) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let hospitals: i64 = tx.query_row("SELECT COUNT(*) FROM hospitals", [], |row| row.get(0))?;
        if hospitals > 0 {
            return Ok(false);
        }

        for tenant in tenants {
            let hospital_id = insert_hospital(&tx, &tenant.name)?;
            for (username, password_hash) in &tenant.staff {
                insert_staff(&tx, username, password_hash, hospital_id)?;
            }
            for patient in &tenant.patients {
                insert_patient(
                    &tx,
                    &Patient {
                        hospital_id,
                        ..patient.clone()
                    },
                )?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    /// Get row counts per table
    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        };

        Ok(StoreCounts {
            hospitals: count("hospitals")?,
            staff: count("staff")?,
            patients: count("patients")?,
        })
    }
}

fn insert_hospital(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO hospitals (name) VALUES (?1)", params![name])
        .map_err(|e| StoreError::from_insert(e, "hospital", None))?;
    Ok(conn.last_insert_rowid())
}

fn insert_staff(conn: &Connection, username: &str, password_hash: &str, hospital_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO staff (username, password_hash, hospital_id) VALUES (?1, ?2, ?3)",
        params![username, password_hash, hospital_id],
    )
    .map_err(|e| StoreError::from_insert(e, "staff", Some(("hospital", hospital_id.to_string()))))?;
    Ok(conn.last_insert_rowid())
}

fn insert_patient(conn: &Connection, patient: &Patient) -> Result<i64> {
    conn.execute(
        &format!(
            "INSERT INTO patients ({PATIENT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        params![
            non_empty(&patient.national_id),
            non_empty(&patient.passport_id),
            patient.patient_hn,
            patient.first_name_th,
            patient.middle_name_th,
            patient.last_name_th,
            patient.first_name_en,
            patient.middle_name_en,
            patient.last_name_en,
            patient.date_of_birth.as_ref().map(date_of_birth::format),
            patient.phone_number,
            patient.email,
            patient.gender.as_str(),
            patient.hospital_id,
        ],
    )
    .map_err(|e| {
        StoreError::from_insert(e, "patient", Some(("hospital", patient.hospital_id.to_string())))
    })?;

    Ok(conn.last_insert_rowid())
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn normalize_filter_value(field: SearchField, value: &str) -> String {
    match field {
        SearchField::DateOfBirth => date_of_birth::parse(value)
            .map(|d| date_of_birth::format(&d))
            .unwrap_or_else(|_| value.to_string()),
        _ => value.to_string(),
    }
}

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        hospital_id: row.get(3)?,
    })
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let dob: Option<String> = row.get(9)?;
    let date_of_birth = dob
        .map(|s| {
            date_of_birth::parse(&s)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))
        })
        .transpose()?;

    let gender_code: String = row.get(12)?;
    let gender = Gender::parse(&gender_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            12,
            Type::Text,
            format!("invalid gender code: {gender_code}").into(),
        )
    })?;

    Ok(Patient {
        national_id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        passport_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        patient_hn: row.get(2)?,
        first_name_th: row.get(3)?,
        middle_name_th: row.get(4)?,
        last_name_th: row.get(5)?,
        first_name_en: row.get(6)?,
        middle_name_en: row.get(7)?,
        last_name_en: row.get(8)?,
        date_of_birth,
        phone_number: row.get(10)?,
        email: row.get(11)?,
        gender,
        hospital_id: row.get(13)?,
    })
}
