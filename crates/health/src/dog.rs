//! Dog profile aggregate: weight logs, vaccinations, weight-trend alerts.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use uuid::Uuid;

use packhub_core::{DogId, DomainEvent, Entity, EventBuffer, UserId};
use packhub_runtime::{AppError, AppResult};

/// Window and threshold for the weight-trend check.
const TREND_WINDOW_DAYS: i64 = 30;
const TREND_THRESHOLD_PERCENT: f64 = 10.0;

/// One weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightLog {
    pub weight_kg: f64,
    pub measured_at: DateTime<Utc>,
}

/// One administered vaccine with its computed expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaccinationRecord {
    pub vaccine_name: String,
    pub administered_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub clinic_name: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightDirection {
    Increased,
    Decreased,
}

impl WeightDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightDirection::Increased => "increased",
            WeightDirection::Decreased => "decreased",
        }
    }
}

/// Raised when a dog's weight moves sharply against its recent trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightAlert {
    pub dog_id: DogId,
    pub previous: f64,
    pub current: f64,
    pub direction: WeightDirection,
}

impl DomainEvent for WeightAlert {
    const KIND: &'static str = "health.weight_alert";

    fn subject(&self) -> Uuid {
        *self.dog_id.as_uuid()
    }
}

/// A dog's health profile.
#[derive(Debug, Clone)]
pub struct DogProfile {
    id: DogId,
    name: String,
    breed: String,
    date_of_birth: DateTime<Utc>,
    owner_id: UserId,
    vaccinations: Vec<VaccinationRecord>,
    weight_logs: Vec<WeightLog>,
    events: EventBuffer,
}

impl DogProfile {
    pub fn register(
        id: DogId,
        name: impl Into<String>,
        breed: impl Into<String>,
        date_of_birth: DateTime<Utc>,
        owner_id: UserId,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::invalid("name", "Name is required."));
        }

        Ok(Self {
            id,
            name,
            breed: breed.into(),
            date_of_birth,
            owner_id,
            vaccinations: Vec::new(),
            weight_logs: Vec::new(),
            events: EventBuffer::new(),
        })
    }

    /// Record a measurement. Runs the trend check against the existing
    /// logs first, so the new measurement never compares against itself.
    pub fn log_weight(&mut self, weight_kg: f64, measured_at: DateTime<Utc>) -> AppResult<()> {
        if weight_kg <= 0.0 {
            return Err(AppError::invalid(
                "weight_kg",
                "Weight must be greater than zero.",
            ));
        }

        self.check_weight_trend(weight_kg, measured_at);
        self.weight_logs.push(WeightLog {
            weight_kg,
            measured_at,
        });
        Ok(())
    }

    fn check_weight_trend(&mut self, new_weight: f64, measured_at: DateTime<Utc>) {
        let threshold = measured_at - Duration::days(TREND_WINDOW_DAYS);

        let Some(last) = self
            .weight_logs
            .iter()
            .filter(|log| log.measured_at >= threshold)
            .max_by_key(|log| log.measured_at)
        else {
            return;
        };

        let change_percent = ((new_weight - last.weight_kg).abs() / last.weight_kg) * 100.0;
        if change_percent <= TREND_THRESHOLD_PERCENT {
            return;
        }

        let direction = if new_weight > last.weight_kg {
            WeightDirection::Increased
        } else {
            WeightDirection::Decreased
        };

        let alert = WeightAlert {
            dog_id: self.id,
            previous: last.weight_kg,
            current: new_weight,
            direction,
        };
        self.events.raise(alert);
    }

    pub fn add_vaccination(
        &mut self,
        vaccine_name: impl Into<String>,
        administered_at: DateTime<Utc>,
        validity_months: u32,
        clinic_name: Option<String>,
    ) -> AppResult<()> {
        let vaccine_name = vaccine_name.into();
        if vaccine_name.trim().is_empty() {
            return Err(AppError::invalid(
                "vaccine_name",
                "Vaccine name cannot be empty.",
            ));
        }

        let expires_at = administered_at
            .checked_add_months(Months::new(validity_months))
            .ok_or_else(|| {
                AppError::invalid("validity_months", "Validity is out of range.")
            })?;

        self.vaccinations.push(VaccinationRecord {
            vaccine_name,
            administered_at,
            expires_at,
            clinic_name,
        });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breed(&self) -> &str {
        &self.breed
    }

    pub fn date_of_birth(&self) -> DateTime<Utc> {
        self.date_of_birth
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn weight_logs(&self) -> &[WeightLog] {
        &self.weight_logs
    }

    pub fn vaccinations(&self) -> &[VaccinationRecord] {
        &self.vaccinations
    }
}

impl Entity for DogProfile {
    type Id = DogId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn events(&self) -> &EventBuffer {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}
