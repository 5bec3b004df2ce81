use serde::{Deserialize, Deserializer, Serialize, de}; // For entity (de)serialization
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid station number: '{0}'")]
    InvalidStation(String),
    #[error("Field '{0}' must not be blank")]
    BlankField(&'static str),
}

/// Case-insensitive comparison used by every natural-key match policy.
fn same_text(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

fn require_text(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::BlankField(field));
    }
    Ok(())
}

// --- Firestation ---

/// Maps an address to the number of the station covering it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Firestation {
    pub address: String,
    /// Station numbers are found both as numbers and as numeric strings in data files.
    #[serde(deserialize_with = "deserialize_station")]
    pub station: i32,
}

impl Firestation {
    pub fn new(address: impl Into<String>, station: i32) -> Self {
        Self {
            address: address.into(),
            station,
        }
    }

    pub fn matches_address(&self, address: &str) -> bool {
        same_text(&self.address, address)
    }

    pub fn matches_station(&self, station: i32) -> bool {
        self.station == station
    }

    /// Rejects a mapping without an address, the natural key of the collection.
    pub fn validate(&self) -> Result<(), DomainError> {
        require_text("address", &self.address)
    }
}

fn deserialize_station<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawStation {
        Number(i32),
        Text(String),
    }

    match RawStation::deserialize(deserializer)? {
        RawStation::Number(number) => Ok(number),
        RawStation::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(DomainError::InvalidStation(text))),
    }
}

// --- Person ---

/// A resident, identified by first and last name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl Person {
    pub fn matches_name(&self, first_name: &str, last_name: &str) -> bool {
        same_text(&self.first_name, first_name) && same_text(&self.last_name, last_name)
    }

    pub fn matches_address(&self, address: &str) -> bool {
        same_text(&self.address, address)
    }

    pub fn matches_city(&self, city: &str) -> bool {
        same_text(&self.city, city)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)
    }
}

// --- Medical Record ---

/// Medical history of a resident, linked to a person by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub first_name: String,
    pub last_name: String,
    /// Kept as written in the data file (`MM/dd/yyyy`).
    #[serde(default)]
    pub birthdate: String,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl MedicalRecord {
    pub fn matches_name(&self, first_name: &str, last_name: &str) -> bool {
        same_text(&self.first_name, first_name) && same_text(&self.last_name, last_name)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn john() -> Person {
        Person {
            first_name: "John".to_string(),
            last_name: "Boyd".to_string(),
            address: "1509 Culver St".to_string(),
            city: "Culver".to_string(),
            zip: "97451".to_string(),
            phone: "841-874-6512".to_string(),
            email: "jaboyd@email.com".to_string(),
        }
    }

    #[test]
    fn firestation_station_accepts_number_and_numeric_text() {
        let from_number: Firestation =
            serde_json::from_value(json!({ "address": "1 Main St", "station": 3 })).unwrap();
        let from_text: Firestation =
            serde_json::from_value(json!({ "address": "1 Main St", "station": " 3" })).unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(from_text.station, 3);
    }

    #[test]
    fn firestation_station_rejects_non_numeric_text() {
        let result: Result<Firestation, _> =
            serde_json::from_value(json!({ "address": "1 Main St", "station": "three" }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid station number"), "unexpected error: {err}");
    }

    #[test]
    fn firestation_station_accepts_negative_numbers() {
        let station: Firestation =
            serde_json::from_value(json!({ "address": "1 Main St", "station": "-2" })).unwrap();
        assert_eq!(station.station, -2);
        assert!(station.matches_station(-2));
    }

    #[test]
    fn firestation_serializes_station_as_number() {
        let value = serde_json::to_value(Firestation::new("1 Main St", 5)).unwrap();
        assert_eq!(value, json!({ "address": "1 Main St", "station": 5 }));
    }

    #[test]
    fn firestation_address_match_ignores_case() {
        let station = Firestation::new("1 Main St", 1);
        assert!(station.matches_address("1 MAIN ST"));
        assert!(station.matches_address("1 main st"));
        assert!(!station.matches_address("2 Main St"));
        assert!(station.matches_station(1));
        assert!(!station.matches_station(2));
    }

    #[test]
    fn firestation_validate_rejects_blank_address() {
        assert_eq!(
            Firestation::new("  ", 1).validate(),
            Err(DomainError::BlankField("address"))
        );
        assert!(Firestation::new("1 Main St", 1).validate().is_ok());
    }

    #[test]
    fn person_uses_camel_case_keys() {
        let value = serde_json::to_value(john()).unwrap();
        assert_eq!(value["firstName"], json!("John"));
        assert_eq!(value["lastName"], json!("Boyd"));
        assert!(value.get("first_name").is_none());
    }

    #[test]
    fn person_matches_by_name_address_and_city() {
        let person = john();
        assert!(person.matches_name("john", "BOYD"));
        assert!(!person.matches_name("Jacob", "Boyd"));
        assert!(person.matches_address("1509 culver st"));
        assert!(person.matches_city("CULVER"));
        assert_eq!(person.full_name(), "John Boyd");
    }

    #[test]
    fn person_validate_rejects_blank_names() {
        let mut person = john();
        person.last_name = String::new();
        assert_eq!(person.validate(), Err(DomainError::BlankField("lastName")));
    }

    #[test]
    fn medical_record_defaults_missing_lists() {
        let record: MedicalRecord = serde_json::from_value(json!({
            "firstName": "Tenley",
            "lastName": "Boyd",
            "birthdate": "02/18/2012"
        }))
        .unwrap();
        assert!(record.medications.is_empty());
        assert!(record.allergies.is_empty());
        assert_eq!(record.birthdate, "02/18/2012");
        assert!(record.matches_name("TENLEY", "boyd"));
    }
}
