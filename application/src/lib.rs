use async_trait::async_trait;
use domain::{DomainError, Firestation, MedicalRecord, Person};
use thiserror::Error;

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// The backing file could not be read or written (OS level or malformed content).
    #[error("I/O failure: {0}")]
    Io(String),
    /// A delete or update targeted a key with no matching entity. Nothing was written.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The mutation was computed in memory but the write-back did not complete.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

impl ApplicationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplicationError::NotFound(_))
    }

    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, ApplicationError::PersistenceFailure(_))
    }
}

// --- Repository Interfaces (Traits) ---
//
// Read operations never fail: an unreadable datasource is reported as an empty result.
// Mutations fail with `NotFound` before touching the datasource, or with
// `PersistenceFailure` when the write-back did not complete.

/// Interface for fire station mappings (address -> station number).
#[async_trait]
pub trait FirestationRepository: Send + Sync {
    /// Lists every fire station mapping.
    async fn find_all(&self) -> Vec<Firestation>;
    /// First mapping for the address, compared case-insensitively.
    async fn find_by_address(&self, address: &str) -> Option<Firestation>;
    /// Every address covered by the station.
    async fn find_by_station_number(&self, station: i32) -> Vec<Firestation>;
    /// Appends a mapping and returns it unchanged.
    async fn save(&self, firestation: Firestation) -> Result<Firestation, ApplicationError>;
    /// Replaces the mapping with the same address, keeping its position.
    async fn update(&self, firestation: Firestation) -> Result<Firestation, ApplicationError>;
    /// Removes every mapping of the station.
    async fn delete_by_station_number(&self, station: i32) -> Result<(), ApplicationError>;
    /// Removes every mapping of the address.
    async fn delete_by_address(&self, address: &str) -> Result<(), ApplicationError>;
}

/// Interface for residents, identified by first and last name.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn find_all(&self) -> Vec<Person>;
    async fn find_by_name(&self, first_name: &str, last_name: &str) -> Option<Person>;
    /// Residents living at the address.
    async fn find_by_address(&self, address: &str) -> Vec<Person>;
    /// Residents of the city.
    async fn find_by_city(&self, city: &str) -> Vec<Person>;
    async fn save(&self, person: Person) -> Result<Person, ApplicationError>;
    async fn update(&self, person: Person) -> Result<Person, ApplicationError>;
    async fn delete_by_name(&self, first_name: &str, last_name: &str)
    -> Result<(), ApplicationError>;
}

/// Interface for medical records, linked to residents by name.
#[async_trait]
pub trait MedicalRecordRepository: Send + Sync {
    async fn find_all(&self) -> Vec<MedicalRecord>;
    async fn find_by_name(&self, first_name: &str, last_name: &str) -> Option<MedicalRecord>;
    async fn save(&self, record: MedicalRecord) -> Result<MedicalRecord, ApplicationError>;
    async fn update(&self, record: MedicalRecord) -> Result<MedicalRecord, ApplicationError>;
    async fn delete_by_name(&self, first_name: &str, last_name: &str)
    -> Result<(), ApplicationError>;
}
