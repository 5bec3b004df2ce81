// ./infrastructure/src/persistence/collection.rs
use super::document_store::{JsonDocument, JsonDocumentStore};
use application::ApplicationError;
use domain::{DomainError, Firestation, MedicalRecord, Person};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// --- Collection Accessor ---

/// An entity kind stored as a named collection of the JSON document.
pub trait CollectionEntity:
    Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
    /// Top-level key of the collection in the datasource.
    const COLLECTION: &'static str;

    /// Structural check run before the entity is written.
    fn validate(&self) -> Result<(), DomainError>;
}

impl CollectionEntity for Firestation {
    const COLLECTION: &'static str = "firestations";

    fn validate(&self) -> Result<(), DomainError> {
        Firestation::validate(self)
    }
}

impl CollectionEntity for Person {
    const COLLECTION: &'static str = "persons";

    fn validate(&self) -> Result<(), DomainError> {
        Person::validate(self)
    }
}

impl CollectionEntity for MedicalRecord {
    const COLLECTION: &'static str = "medicalrecords";

    fn validate(&self) -> Result<(), DomainError> {
        MedicalRecord::validate(self)
    }
}

/// Typed view of one collection. An absent or `null` key is an empty collection.
///
/// Only the node under `E::COLLECTION` is deserialized; malformed entries elsewhere in
/// the document do not affect it.
pub fn get_collection<E: CollectionEntity>(document: &JsonDocument) -> Result<Vec<E>, ApplicationError> {
    match document.node(E::COLLECTION) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(node) => Vec::<E>::deserialize(node).map_err(|e| {
            error!(collection = E::COLLECTION, "Malformed collection: {}", e);
            ApplicationError::Io(format!("malformed {} collection: {}", E::COLLECTION, e))
        }),
    }
}

/// Splices `collection` under its key. Sibling collections and unknown keys are untouched.
pub fn replace_collection<E: CollectionEntity>(
    document: &mut JsonDocument,
    collection: &[E],
) -> Result<(), ApplicationError> {
    let node = serde_json::to_value(collection).map_err(|e| {
        ApplicationError::PersistenceFailure(format!(
            "failed to serialize {}: {}",
            E::COLLECTION,
            e
        ))
    })?;
    document.replace_node(E::COLLECTION, node);
    Ok(())
}

// --- Collection Repository ---

/// Generic read-modify-write repository over one collection of the datasource.
///
/// Nothing is cached between calls: each call reads the whole document fresh, and each
/// mutation writes the whole document back while holding the store lock.
#[derive(Debug)]
pub struct JsonCollection<E> {
    store: Arc<JsonDocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for JsonCollection<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: CollectionEntity> JsonCollection<E> {
    pub fn new(store: Arc<JsonDocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Every entity of the collection. Read failures are logged and yield an empty list.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn find_all(&self) -> Vec<E> {
        let read = match self.store.read_document().await {
            Ok(Some(document)) => get_collection::<E>(&document),
            Ok(None) => {
                warn!("Datasource is absent or empty, no {} found.", E::COLLECTION);
                return Vec::new();
            }
            Err(e) => Err(e),
        };
        match read {
            Ok(entities) => {
                if entities.is_empty() {
                    warn!("No {} found.", E::COLLECTION);
                } else {
                    debug!(count = entities.len(), "Found {}", E::COLLECTION);
                }
                entities
            }
            Err(e) => {
                error!("Failed to read {}: {}", E::COLLECTION, e);
                Vec::new()
            }
        }
    }

    /// Every entity accepted by `predicate`, in collection order.
    pub async fn find_matching<P>(&self, predicate: P) -> Vec<E>
    where
        P: Fn(&E) -> bool,
    {
        self.find_all()
            .await
            .into_iter()
            .filter(|entity| predicate(entity))
            .collect()
    }

    /// The first entity accepted by `predicate`.
    pub async fn find_first<P>(&self, predicate: P) -> Option<E>
    where
        P: Fn(&E) -> bool,
    {
        self.find_all()
            .await
            .into_iter()
            .find(|entity| predicate(entity))
    }

    /// Appends `entity` and writes the document back. Returns the entity unchanged.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn save(&self, entity: E) -> Result<E, ApplicationError> {
        entity.validate()?;
        let lock = self.store.lock().await;
        // An absent datasource is initialized by the first write.
        let mut document = lock
            .read_document()
            .await?
            .unwrap_or_else(JsonDocument::initialized);

        let mut collection = get_collection::<E>(&document)?;
        collection.push(entity.clone());
        replace_collection(&mut document, &collection)?;

        if !lock.write_document(&document).await {
            error!("Failed to save new entry into {}", E::COLLECTION);
            return Err(ApplicationError::PersistenceFailure(format!(
                "failed to save entry into {}",
                E::COLLECTION
            )));
        }
        debug!("Saved new entry into {}", E::COLLECTION);
        Ok(entity)
    }

    /// Replaces the first entity accepted by `predicate` with `entity`, in place.
    ///
    /// Fails with `NotFound(key)` without writing when nothing matches.
    #[instrument(skip(self, predicate, entity), fields(collection = E::COLLECTION))]
    pub async fn update_matching<P>(
        &self,
        key: &str,
        predicate: P,
        entity: E,
    ) -> Result<E, ApplicationError>
    where
        P: Fn(&E) -> bool,
    {
        entity.validate()?;
        let lock = self.store.lock().await;
        let Some(mut document) = lock.read_document().await? else {
            warn!("Update failed: datasource is absent or empty");
            return Err(ApplicationError::NotFound(key.to_string()));
        };

        let mut collection = get_collection::<E>(&document)?;
        let Some(position) = collection.iter().position(|existing| predicate(existing)) else {
            warn!("Update failed: no entry matches {}", key);
            return Err(ApplicationError::NotFound(key.to_string()));
        };
        collection[position] = entity.clone();
        replace_collection(&mut document, &collection)?;

        if !lock.write_document(&document).await {
            error!("Failed to write {} after update of {}", E::COLLECTION, key);
            return Err(ApplicationError::PersistenceFailure(format!(
                "failed to update {} after change of {}",
                E::COLLECTION, key
            )));
        }
        debug!(position, "Updated entry of {}", E::COLLECTION);
        Ok(entity)
    }

    /// Removes every entity accepted by `predicate` and returns them.
    ///
    /// Fails with `NotFound(key)` without writing when nothing matches, so callers can
    /// tell an empty result from a failed write-back.
    #[instrument(skip(self, predicate), fields(collection = E::COLLECTION))]
    pub async fn delete_matching<P>(&self, key: &str, predicate: P) -> Result<Vec<E>, ApplicationError>
    where
        P: Fn(&E) -> bool,
    {
        let lock = self.store.lock().await;
        let Some(mut document) = lock.read_document().await? else {
            warn!("Deletion failed: datasource is absent or empty");
            return Err(ApplicationError::NotFound(key.to_string()));
        };

        let collection = get_collection::<E>(&document)?;
        if !collection.iter().any(|existing| predicate(existing)) {
            warn!("Deletion failed: no entry matches {}", key);
            return Err(ApplicationError::NotFound(key.to_string()));
        }
        let (removed, kept): (Vec<E>, Vec<E>) = collection
            .into_iter()
            .partition(|existing| predicate(existing));
        replace_collection(&mut document, &kept)?;

        if !lock.write_document(&document).await {
            error!("Error when updating JSON file after deletion of {}", key);
            return Err(ApplicationError::PersistenceFailure(format!(
                "failed to update {} after deletion of {}",
                E::COLLECTION, key
            )));
        }
        info!(removed = removed.len(), "Deleted {} from {}", key, E::COLLECTION);
        Ok(removed)
    }
}
