// Module declarations
pub mod config;
pub mod persistence;

// Re-export the configuration and the JSON-backed implementations
pub use config::{DataSourceConfig, WriteMode};
pub use persistence::{
    JsonDocument, JsonDocumentStore, JsonFirestationRepository, JsonMedicalRecordRepository,
    JsonPersonRepository,
};
