//! Demo data for local development.

use chrono::NaiveDate;
use hospital_core::{Gender, Patient};
use hospital_store::{SqliteStore, TenantSeed};

use crate::error::Result;
use crate::session::hash_password;

const HOSPITALS: [&str; 3] = [
    "โรงพยาบาลศิริราช",
    "โรงพยาบาลจุฬาลงกรณ์",
    "โรงพยาบาลรามาธิบดี",
];

const DEMO_PASSWORD: &str = "password123";

/// (hn, national_id, passport_id, first_th, last_th, first_en, last_en, dob, phone, email, gender, hospital index)
type PatientRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    (i32, u32, u32),
    &'static str,
    &'static str,
    Gender,
    usize,
);

const PATIENTS: [PatientRow; 6] = [
    ("HN001", "1234567890123", "P001", "สมชาย", "ใจดี", "Somchai", "Jaidee", (1990, 1, 15), "081-234-5678", "somchai@test.com", Gender::Male, 0),
    ("HN002", "2345678901234", "P002", "สมหญิง", "สวยงาม", "Somying", "Suaynam", (1985, 6, 20), "082-345-6789", "somying@test.com", Gender::Female, 1),
    ("HN003", "3456789012345", "P003", "วิชัย", "เก่งมาก", "Wichai", "Kengmak", (1992, 12, 10), "083-456-7890", "wichai@test.com", Gender::Male, 2),
    ("HN004", "4567890123456", "P004", "วันทนา", "รักดี", "Wantana", "Rakdee", (1985, 6, 20), "084-567-8901", "wantana@test.com", Gender::Female, 0),
    ("HN005", "5678901234567", "P005", "ประพจน์", "สมประสงค์", "Prapot", "Somprasong", (1992, 12, 10), "085-678-9012", "prapot@test.com", Gender::Male, 1),
    ("HN006", "6789012345678", "P006", "สุภาพร", "เรียนดี", "Supaporn", "Riandee", (1990, 1, 15), "086-789-0123", "supaporn@test.com", Gender::Female, 2),
];

/// Insert demo hospitals, staff and patients into an empty store.
///
/// Everything goes in as one transaction. Returns `false` without touching
/// anything when hospitals already exist.
pub fn seed_demo_data(store: &SqliteStore) -> Result<bool> {
    if store.counts()?.hospitals > 0 {
        tracing::info!("Seed: store already has data, skipping");
        return Ok(false);
    }

    let mut tenants = Vec::with_capacity(HOSPITALS.len());
    for (i, name) in HOSPITALS.iter().enumerate() {
        tenants.push(TenantSeed {
            name: name.to_string(),
            staff: vec![(format!("admin{}", i + 1), hash_password(DEMO_PASSWORD)?)],
            patients: Vec::new(),
        });
    }

    for (hn, national_id, passport_id, first_th, last_th, first_en, last_en, (y, m, d), phone, email, gender, hospital) in
        PATIENTS
    {
        tenants[hospital].patients.push(Patient {
            national_id: national_id.to_string(),
            passport_id: passport_id.to_string(),
            patient_hn: hn.to_string(),
            first_name_th: first_th.to_string(),
            middle_name_th: String::new(),
            last_name_th: last_th.to_string(),
            first_name_en: first_en.to_string(),
            middle_name_en: String::new(),
            last_name_en: last_en.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(y, m, d),
            phone_number: phone.to_string(),
            email: email.to_string(),
            gender,
            hospital_id: 0,
        });
    }

    if !store.seed_if_empty(&tenants)? {
        tracing::info!("Seed: store already has data, skipping");
        return Ok(false);
    }

    let counts = store.counts()?;
    tracing::info!(
        hospitals = counts.hospitals,
        staff = counts.staff,
        patients = counts.patients,
        "Seed: demo data inserted"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_core::{SearchField, SearchFilters};

    #[test]
    fn test_seed_populates_empty_store() {
        let store = SqliteStore::open(":memory:").unwrap();
        assert!(seed_demo_data(&store).unwrap());

        let counts = store.counts().unwrap();
        assert_eq!((counts.hospitals, counts.staff, counts.patients), (3, 3, 6));

        let siriraj = store.find_hospital_by_name("โรงพยาบาลศิริราช").unwrap().unwrap();
        let admin1 = store.find_staff_by_username("admin1").unwrap().unwrap();
        assert_eq!(admin1.hospital_id, siriraj.id);

        let filters = SearchFilters::new().with(SearchField::DateOfBirth, "1990-01-15");
        let hns: Vec<String> = store
            .find_patients(siriraj.id, &filters)
            .unwrap()
            .into_iter()
            .map(|p| p.patient_hn)
            .collect();
        assert_eq!(hns, vec!["HN001"]);
    }

    #[test]
    fn test_seed_skips_existing_data() {
        let store = SqliteStore::open(":memory:").unwrap();
        store.create_hospital("โรงพยาบาลอื่น").unwrap();

        assert!(!seed_demo_data(&store).unwrap());
        let counts = store.counts().unwrap();
        assert_eq!((counts.hospitals, counts.staff, counts.patients), (1, 0, 0));
    }
}
