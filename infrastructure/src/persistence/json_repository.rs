// ./infrastructure/src/persistence/json_repository.rs
use super::collection::JsonCollection;
use super::document_store::JsonDocumentStore;
use application::{
    ApplicationError, FirestationRepository, MedicalRecordRepository, PersonRepository,
};
use async_trait::async_trait;
use domain::{Firestation, MedicalRecord, Person};
use std::sync::Arc;
use tracing::{debug, info, instrument};

// --- Firestation Repository Implementation ---

#[derive(Debug, Clone)]
pub struct JsonFirestationRepository {
    firestations: JsonCollection<Firestation>,
}

impl JsonFirestationRepository {
    pub fn new(store: Arc<JsonDocumentStore>) -> Self {
        Self {
            firestations: JsonCollection::new(store),
        }
    }
}

#[async_trait]
impl FirestationRepository for JsonFirestationRepository {
    async fn find_all(&self) -> Vec<Firestation> {
        self.firestations.find_all().await
    }

    #[instrument(skip(self))]
    async fn find_by_address(&self, address: &str) -> Option<Firestation> {
        let found = self
            .firestations
            .find_first(|firestation| firestation.matches_address(address))
            .await;
        debug!("Found station {:?} at address {}.", found, address);
        found
    }

    #[instrument(skip(self))]
    async fn find_by_station_number(&self, station: i32) -> Vec<Firestation> {
        let found = self
            .firestations
            .find_matching(|firestation| firestation.matches_station(station))
            .await;
        debug!("Fire stations with station number {} are: {:?}", station, found);
        found
    }

    async fn save(&self, firestation: Firestation) -> Result<Firestation, ApplicationError> {
        let saved = self.firestations.save(firestation).await?;
        info!("Saved new firestation n°{} at {}.", saved.station, saved.address);
        Ok(saved)
    }

    async fn update(&self, firestation: Firestation) -> Result<Firestation, ApplicationError> {
        let address = firestation.address.clone();
        let updated = self
            .firestations
            .update_matching(
                &format!("fire station at address {}", address),
                |existing| existing.matches_address(&address),
                firestation,
            )
            .await?;
        info!("Address {} is now covered by firestation n°{}.", updated.address, updated.station);
        Ok(updated)
    }

    async fn delete_by_station_number(&self, station: i32) -> Result<(), ApplicationError> {
        let removed = self
            .firestations
            .delete_matching(&format!("fire station with station number {}", station), |existing| {
                existing.matches_station(station)
            })
            .await?;
        info!("Deleted firestation n°{}: {:?}", station, removed);
        Ok(())
    }

    async fn delete_by_address(&self, address: &str) -> Result<(), ApplicationError> {
        let removed = self
            .firestations
            .delete_matching(&format!("fire station at address {}", address), |existing| {
                existing.matches_address(address)
            })
            .await?;
        info!("Firestation {:?} was successfully deleted", removed);
        Ok(())
    }
}

// --- Person Repository Implementation ---

#[derive(Debug, Clone)]
pub struct JsonPersonRepository {
    persons: JsonCollection<Person>,
}

impl JsonPersonRepository {
    pub fn new(store: Arc<JsonDocumentStore>) -> Self {
        Self {
            persons: JsonCollection::new(store),
        }
    }
}

fn person_key(first_name: &str, last_name: &str) -> String {
    format!("person named {} {}", first_name, last_name)
}

#[async_trait]
impl PersonRepository for JsonPersonRepository {
    async fn find_all(&self) -> Vec<Person> {
        self.persons.find_all().await
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, first_name: &str, last_name: &str) -> Option<Person> {
        self.persons
            .find_first(|person| person.matches_name(first_name, last_name))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_address(&self, address: &str) -> Vec<Person> {
        self.persons
            .find_matching(|person| person.matches_address(address))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_city(&self, city: &str) -> Vec<Person> {
        self.persons
            .find_matching(|person| person.matches_city(city))
            .await
    }

    async fn save(&self, person: Person) -> Result<Person, ApplicationError> {
        let saved = self.persons.save(person).await?;
        info!("Saved new person {}.", saved.full_name());
        Ok(saved)
    }

    async fn update(&self, person: Person) -> Result<Person, ApplicationError> {
        let (first_name, last_name) = (person.first_name.clone(), person.last_name.clone());
        let updated = self
            .persons
            .update_matching(
                &person_key(&first_name, &last_name),
                |existing| existing.matches_name(&first_name, &last_name),
                person,
            )
            .await?;
        info!("Updated person {}.", updated.full_name());
        Ok(updated)
    }

    async fn delete_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), ApplicationError> {
        self.persons
            .delete_matching(&person_key(first_name, last_name), |existing| {
                existing.matches_name(first_name, last_name)
            })
            .await?;
        info!("Person {} {} was successfully deleted", first_name, last_name);
        Ok(())
    }
}

// --- Medical Record Repository Implementation ---

#[derive(Debug, Clone)]
pub struct JsonMedicalRecordRepository {
    records: JsonCollection<MedicalRecord>,
}

impl JsonMedicalRecordRepository {
    pub fn new(store: Arc<JsonDocumentStore>) -> Self {
        Self {
            records: JsonCollection::new(store),
        }
    }
}

fn record_key(first_name: &str, last_name: &str) -> String {
    format!("medical record of {} {}", first_name, last_name)
}

#[async_trait]
impl MedicalRecordRepository for JsonMedicalRecordRepository {
    async fn find_all(&self) -> Vec<MedicalRecord> {
        self.records.find_all().await
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, first_name: &str, last_name: &str) -> Option<MedicalRecord> {
        self.records
            .find_first(|record| record.matches_name(first_name, last_name))
            .await
    }

    async fn save(&self, record: MedicalRecord) -> Result<MedicalRecord, ApplicationError> {
        let saved = self.records.save(record).await?;
        info!("Saved medical record of {}.", saved.full_name());
        Ok(saved)
    }

    async fn update(&self, record: MedicalRecord) -> Result<MedicalRecord, ApplicationError> {
        let (first_name, last_name) = (record.first_name.clone(), record.last_name.clone());
        let updated = self
            .records
            .update_matching(
                &record_key(&first_name, &last_name),
                |existing| existing.matches_name(&first_name, &last_name),
                record,
            )
            .await?;
        info!("Updated medical record of {}.", updated.full_name());
        Ok(updated)
    }

    async fn delete_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), ApplicationError> {
        self.records
            .delete_matching(&record_key(first_name, last_name), |existing| {
                existing.matches_name(first_name, last_name)
            })
            .await?;
        info!("Medical record of {} {} was successfully deleted", first_name, last_name);
        Ok(())
    }
}
