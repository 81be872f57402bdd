//! Health requests: registration, weight logging, vaccinations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use packhub_core::{DogId, Entity, UserId};
use packhub_runtime::{AppError, AppResult, Handle, Request, RuleSet, UnitOfWork};

use crate::dog::DogProfile;
use crate::store::HealthStore;

const MAX_NAME_LEN: usize = 100;
const MAX_VACCINE_NAME_LEN: usize = 200;
const MAX_PLAUSIBLE_WEIGHT_KG: f64 = 150.0;

// ---------------------------------------------------------------------------
// Register dog

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDog {
    pub name: String,
    pub breed: String,
    pub date_of_birth: DateTime<Utc>,
    pub owner_id: UserId,
}

impl Request for RegisterDog {
    type Response = DogId;
}

pub fn register_dog_rules() -> RuleSet<RegisterDog> {
    RuleSet::new()
        .rule("name", |r: &RegisterDog| {
            r.name.trim().is_empty().then(|| "Name is required.".to_string())
        })
        .rule("name", |r: &RegisterDog| {
            (r.name.len() > MAX_NAME_LEN)
                .then(|| format!("Name must be at most {MAX_NAME_LEN} characters."))
        })
        .rule("breed", |r: &RegisterDog| {
            r.breed.trim().is_empty().then(|| "Breed is required.".to_string())
        })
        .rule("date_of_birth", |r: &RegisterDog| {
            (r.date_of_birth >= Utc::now())
                .then(|| "Date of birth must be in the past.".to_string())
        })
        .rule("owner_id", |r: &RegisterDog| {
            r.owner_id.is_nil().then(|| "Owner is required.".to_string())
        })
}

pub struct RegisterDogHandler {
    pub uow: UnitOfWork<HealthStore>,
}

#[async_trait]
impl Handle<RegisterDog> for RegisterDogHandler {
    async fn handle(&self, request: RegisterDog) -> AppResult<DogId> {
        let dog = DogProfile::register(
            DogId::new(),
            request.name,
            request.breed,
            request.date_of_birth,
            request.owner_id,
        )?;
        let id = *dog.id();

        self.uow.commit(vec![dog]).await?;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Log weight

#[derive(Debug, Clone, Deserialize)]
pub struct LogWeight {
    pub dog_id: DogId,
    pub weight_kg: f64,
    pub measured_at: DateTime<Utc>,
}

impl Request for LogWeight {
    type Response = ();
}

pub fn log_weight_rules() -> RuleSet<LogWeight> {
    RuleSet::new()
        .rule("dog_id", |r: &LogWeight| {
            r.dog_id.is_nil().then(|| "Dog is required.".to_string())
        })
        .rule("weight_kg", |r: &LogWeight| {
            (r.weight_kg <= 0.0).then(|| "Weight must be greater than 0.".to_string())
        })
        .rule("weight_kg", |r: &LogWeight| {
            (r.weight_kg >= MAX_PLAUSIBLE_WEIGHT_KG)
                .then(|| "Are you sure that's a dog and not a bear?".to_string())
        })
        .rule("measured_at", |r: &LogWeight| {
            (r.measured_at > Utc::now())
                .then(|| "Cannot log weight in the future.".to_string())
        })
}

pub struct LogWeightHandler {
    pub dogs: Arc<HealthStore>,
    pub uow: UnitOfWork<HealthStore>,
}

#[async_trait]
impl Handle<LogWeight> for LogWeightHandler {
    async fn handle(&self, request: LogWeight) -> AppResult<()> {
        let mut dog = self.dogs.get(&request.dog_id).ok_or_else(|| {
            AppError::conflict(format!("dog {} does not exist", request.dog_id))
        })?;

        dog.log_weight(request.weight_kg, request.measured_at)?;

        self.uow.commit(vec![dog]).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Record vaccination

#[derive(Debug, Clone, Deserialize)]
pub struct RecordVaccination {
    pub dog_id: DogId,
    pub vaccine_name: String,
    pub date_administered: DateTime<Utc>,
    pub validity_months: u32,
    pub clinic_name: Option<String>,
}

impl Request for RecordVaccination {
    type Response = ();
}

pub fn record_vaccination_rules() -> RuleSet<RecordVaccination> {
    RuleSet::new()
        .rule("dog_id", |r: &RecordVaccination| {
            r.dog_id.is_nil().then(|| "Dog is required.".to_string())
        })
        .rule("vaccine_name", |r: &RecordVaccination| {
            r.vaccine_name
                .trim()
                .is_empty()
                .then(|| "Vaccine name is required.".to_string())
        })
        .rule("vaccine_name", |r: &RecordVaccination| {
            (r.vaccine_name.len() > MAX_VACCINE_NAME_LEN)
                .then(|| format!("Vaccine name must be at most {MAX_VACCINE_NAME_LEN} characters."))
        })
        .rule("validity_months", |r: &RecordVaccination| {
            (r.validity_months == 0)
                .then(|| "Vaccine must be valid for at least 1 month.".to_string())
        })
        .rule("date_administered", |r: &RecordVaccination| {
            (r.date_administered > Utc::now())
                .then(|| "Vaccination date cannot be in the future.".to_string())
        })
}

pub struct RecordVaccinationHandler {
    pub dogs: Arc<HealthStore>,
    pub uow: UnitOfWork<HealthStore>,
}

#[async_trait]
impl Handle<RecordVaccination> for RecordVaccinationHandler {
    async fn handle(&self, request: RecordVaccination) -> AppResult<()> {
        let mut dog = self.dogs.get(&request.dog_id).ok_or_else(|| {
            AppError::conflict(format!("dog {} does not exist", request.dog_id))
        })?;

        dog.add_vaccination(
            request.vaccine_name,
            request.date_administered,
            request.validity_months,
            request.clinic_name,
        )?;

        self.uow.commit(vec![dog]).await?;
        Ok(())
    }
}
