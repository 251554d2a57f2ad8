//! Tenant-owned records: hospitals, staff and patients.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A hospital tenant. Every staff member and patient belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
}

/// A staff account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Staff {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub hospital_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// A patient record.
///
/// `national_id` and `passport_id` are alternate identifiers and either may be
/// empty. `hospital_id` is the owning tenant; on records decoded from a
/// partner registry it is untrusted until the resolver stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub national_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub passport_id: String,
    pub patient_hn: String,
    #[serde(default)]
    pub first_name_th: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub middle_name_th: String,
    #[serde(default)]
    pub last_name_th: String,
    #[serde(default)]
    pub first_name_en: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub middle_name_en: String,
    #[serde(default)]
    pub last_name_en: String,
    #[serde(
        default,
        with = "date_of_birth",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub gender: Gender,
    #[serde(default, deserialize_with = "lenient_hospital_id")]
    pub hospital_id: i64,
}

impl Patient {
    /// Identifiers usable for a registry lookup, in lookup order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        [self.national_id.as_str(), self.passport_id.as_str()]
            .into_iter()
            .filter(|id| !id.is_empty())
    }
}

/// Partner systems send the tenant as a number, a numeric string, or not at all.
fn lenient_hospital_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Raw::Int(id)) => Ok(id),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Raw::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// `YYYY-MM-DD` on output; on input also the date part of an RFC 3339 timestamp.
pub mod date_of_birth {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map(Some).map_err(serde::de::Error::custom),
        }
    }

    /// Accepts a whole `YYYY-MM-DD` date or a whole RFC 3339 timestamp.
    pub fn parse(s: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(s, FORMAT).or_else(|date_err| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.date_naive())
                .map_err(|_| date_err)
        })
    }

    pub fn format(date: &NaiveDate) -> String {
        date.format(FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn somchai() -> Patient {
        Patient {
            national_id: "1234567890123".to_string(),
            passport_id: String::new(),
            patient_hn: "HN001".to_string(),
            first_name_th: "สมชาย".to_string(),
            middle_name_th: String::new(),
            last_name_th: "ใจดี".to_string(),
            first_name_en: "Somchai".to_string(),
            middle_name_en: String::new(),
            last_name_en: "Jaidee".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15),
            phone_number: "081-234-5678".to_string(),
            email: String::new(),
            gender: Gender::Male,
            hospital_id: 1,
        }
    }

    #[test]
    fn test_serialize_omits_empty_optional_fields() {
        let value = serde_json::to_value(somchai()).unwrap();
        assert_eq!(value["national_id"], "1234567890123");
        assert_eq!(value["date_of_birth"], "1990-01-15");
        assert_eq!(value["gender"], "M");
        assert!(value.get("passport_id").is_none());
        assert!(value.get("email").is_none());
        assert!(value.get("middle_name_th").is_none());
    }

    #[test]
    fn test_decode_registry_payload_with_timestamp_and_string_tenant() {
        let payload = json!({
            "national_id": "2345678901234",
            "patient_hn": "HN002",
            "first_name_th": "สมหญิง",
            "last_name_th": "สวยงาม",
            "first_name_en": "Somying",
            "last_name_en": "Suaynam",
            "date_of_birth": "1985-06-20T00:00:00Z",
            "passport_id": "P002",
            "gender": "F",
            "hospital_id": "2"
        });

        let patient: Patient = serde_json::from_value(payload).unwrap();
        assert_eq!(patient.hospital_id, 2);
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1985, 6, 20));
        assert_eq!(patient.gender, Gender::Female);
        assert_eq!(patient.middle_name_en, "");
    }

    #[test]
    fn test_date_of_birth_parse_requires_whole_value() {
        let expected = NaiveDate::from_ymd_opt(1990, 1, 15).unwrap();
        assert_eq!(date_of_birth::parse("1990-01-15").unwrap(), expected);
        assert_eq!(date_of_birth::parse("1990-01-15T00:00:00Z").unwrap(), expected);
        assert_eq!(date_of_birth::parse("1990-01-15T00:00:00+07:00").unwrap(), expected);

        assert!(date_of_birth::parse("1990-01-15NOT-A-DATE").is_err());
        assert!(date_of_birth::parse("1990-01-15T99").is_err());
        assert!(date_of_birth::parse("1990-1-15x").is_err());
    }

    #[test]
    fn test_decode_registry_payload_without_tenant() {
        let payload = json!({"patient_hn": "X1", "gender": "M"});
        let patient: Patient = serde_json::from_value(payload).unwrap();
        assert_eq!(patient.hospital_id, 0);
        assert_eq!(patient.date_of_birth, None);
    }

    #[test]
    fn test_decode_rejects_unknown_gender() {
        let payload = json!({"patient_hn": "X1", "gender": "X"});
        assert!(serde_json::from_value::<Patient>(payload).is_err());
    }

    #[test]
    fn test_identifiers_skip_empty() {
        let mut patient = somchai();
        assert_eq!(patient.identifiers().collect::<Vec<_>>(), vec!["1234567890123"]);

        patient.national_id.clear();
        patient.passport_id = "P001".to_string();
        assert_eq!(patient.identifiers().collect::<Vec<_>>(), vec!["P001"]);
    }

    #[test]
    fn test_staff_serialization_hides_hash() {
        let staff = Staff {
            id: 7,
            username: "admin1".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            hospital_id: 1,
        };
        let value = serde_json::to_value(&staff).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["username"], "admin1");
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::parse("M"), Some(Gender::Male));
        assert_eq!(Gender::parse("F"), Some(Gender::Female));
        assert_eq!(Gender::parse("m"), None);
        assert_eq!(Gender::Female.as_str(), "F");
    }
}
