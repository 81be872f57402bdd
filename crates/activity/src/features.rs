//! Activity requests: add a location, find nearby swim spots.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use packhub_core::{Entity, LocationId};
use packhub_runtime::{AppResult, Handle, Request, RuleSet, UnitOfWork};

use crate::location::{Location, LocationType, WaterCleanliness, WaveIntensity};
use crate::store::ActivityStore;

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_RADIUS_KM: f64 = 500.0;

/// Kilometres per coordinate degree (planar approximation).
const KM_PER_DEGREE: f64 = 111.32;
const METERS_PER_DEGREE: f64 = 111_320.0;

// ---------------------------------------------------------------------------
// Add location

#[derive(Debug, Clone, Deserialize)]
pub struct AddLocation {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: LocationType,
    pub wave_intensity: WaveIntensity,
    pub cleanliness: WaterCleanliness,
}

impl Request for AddLocation {
    type Response = LocationId;
}

pub fn add_location_rules() -> RuleSet<AddLocation> {
    RuleSet::new()
        .rule("name", |r: &AddLocation| {
            r.name
                .trim()
                .is_empty()
                .then(|| "Location name is required.".to_string())
        })
        .rule("name", |r: &AddLocation| {
            (r.name.len() > MAX_NAME_LEN)
                .then(|| format!("Name must be at most {MAX_NAME_LEN} characters."))
        })
        .rule("description", |r: &AddLocation| {
            (r.description.len() > MAX_DESCRIPTION_LEN)
                .then(|| format!("Description must be at most {MAX_DESCRIPTION_LEN} characters."))
        })
        .rule("latitude", |r: &AddLocation| {
            (!(-90.0..=90.0).contains(&r.latitude))
                .then(|| "Latitude must be between -90 and 90.".to_string())
        })
        .rule("longitude", |r: &AddLocation| {
            (!(-180.0..=180.0).contains(&r.longitude))
                .then(|| "Longitude must be between -180 and 180.".to_string())
        })
}

pub struct AddLocationHandler {
    pub uow: UnitOfWork<ActivityStore>,
}

#[async_trait]
impl Handle<AddLocation> for AddLocationHandler {
    async fn handle(&self, request: AddLocation) -> AppResult<LocationId> {
        let location = Location::new(
            LocationId::new(),
            request.name,
            request.description,
            request.latitude,
            request.longitude,
            request.location_type,
            request.wave_intensity,
            request.cleanliness,
        )?;
        let id = *location.id();

        self.uow.commit(vec![location]).await?;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Nearby locations

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyLocations {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl Request for NearbyLocations {
    type Response = Vec<LocationView>;
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationView {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: &'static str,
    pub cleanliness: &'static str,
    pub distance_m: f64,
}

pub fn nearby_rules() -> RuleSet<NearbyLocations> {
    RuleSet::new()
        .rule("latitude", |r: &NearbyLocations| {
            (!(-90.0..=90.0).contains(&r.latitude))
                .then(|| "Latitude must be between -90 and 90.".to_string())
        })
        .rule("longitude", |r: &NearbyLocations| {
            (!(-180.0..=180.0).contains(&r.longitude))
                .then(|| "Longitude must be between -180 and 180.".to_string())
        })
        .rule("radius_km", |r: &NearbyLocations| {
            (r.radius_km <= 0.0 || r.radius_km >= MAX_RADIUS_KM)
                .then(|| format!("Radius must be between 0 and {MAX_RADIUS_KM} km."))
        })
}

/// Calm-and-clean filter: still-water spots (lakes, or anywhere without
/// waves) that are not dirty, within the radius, closest first.
pub struct NearbyLocationsHandler {
    pub locations: Arc<ActivityStore>,
}

#[async_trait]
impl Handle<NearbyLocations> for NearbyLocationsHandler {
    async fn handle(&self, request: NearbyLocations) -> AppResult<Vec<LocationView>> {
        let radius_degrees = request.radius_km / KM_PER_DEGREE;

        let mut matches: Vec<(f64, Location)> = self
            .locations
            .all()
            .into_iter()
            .filter(|l| {
                l.location_type() == LocationType::Lake
                    || l.wave_intensity() == WaveIntensity::None
            })
            .filter(|l| l.cleanliness() != WaterCleanliness::Dirty)
            .map(|l| (l.degree_distance(request.latitude, request.longitude), l))
            .filter(|(distance, _)| *distance <= radius_degrees)
            .collect();

        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(matches
            .into_iter()
            .map(|(distance, l)| LocationView {
                id: *l.id(),
                name: l.name().to_string(),
                description: l.description().to_string(),
                latitude: l.latitude(),
                longitude: l.longitude(),
                location_type: l.location_type().as_str(),
                cleanliness: l.cleanliness().as_str(),
                distance_m: distance * METERS_PER_DEGREE,
            })
            .collect())
    }
}
