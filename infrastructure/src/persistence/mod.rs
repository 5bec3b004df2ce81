pub mod collection;
pub mod document_store;
pub mod json_repository;

// Re-export the store and the per-entity repositories
pub use collection::{CollectionEntity, JsonCollection, get_collection, replace_collection};
pub use document_store::{COLLECTION_KEYS, DocumentLock, JsonDocument, JsonDocumentStore};
pub use json_repository::{
    JsonFirestationRepository, JsonMedicalRecordRepository, JsonPersonRepository,
};
