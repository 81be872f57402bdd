//! Location entity.

use serde::{Deserialize, Serialize};

use packhub_core::{Entity, EventBuffer, LocationId};
use packhub_runtime::{AppError, AppResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Lake,
    Sea,
    River,
    Forest,
    Park,
}

impl LocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationType::Lake => "lake",
            LocationType::Sea => "sea",
            LocationType::River => "river",
            LocationType::Forest => "forest",
            LocationType::Park => "park",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveIntensity {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterCleanliness {
    Dirty,
    Acceptable,
    Good,
    CrystalClear,
}

impl WaterCleanliness {
    pub fn as_str(self) -> &'static str {
        match self {
            WaterCleanliness::Dirty => "dirty",
            WaterCleanliness::Acceptable => "acceptable",
            WaterCleanliness::Good => "good",
            WaterCleanliness::CrystalClear => "crystal_clear",
        }
    }
}

/// A catalogued outdoor spot.
#[derive(Debug, Clone)]
pub struct Location {
    id: LocationId,
    name: String,
    description: String,
    latitude: f64,
    longitude: f64,
    location_type: LocationType,
    wave_intensity: WaveIntensity,
    cleanliness: WaterCleanliness,
    events: EventBuffer,
}

impl Location {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        description: impl Into<String>,
        latitude: f64,
        longitude: f64,
        location_type: LocationType,
        wave_intensity: WaveIntensity,
        cleanliness: WaterCleanliness,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::invalid("name", "Location name is required."));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::invalid(
                "latitude",
                "Latitude must be between -90 and 90.",
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::invalid(
                "longitude",
                "Longitude must be between -180 and 180.",
            ));
        }

        Ok(Self {
            id,
            name,
            description: description.into(),
            latitude,
            longitude,
            location_type,
            wave_intensity,
            cleanliness,
            events: EventBuffer::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn location_type(&self) -> LocationType {
        self.location_type
    }

    pub fn wave_intensity(&self) -> WaveIntensity {
        self.wave_intensity
    }

    pub fn cleanliness(&self) -> WaterCleanliness {
        self.cleanliness
    }

    pub fn update_cleanliness(&mut self, level: WaterCleanliness) {
        self.cleanliness = level;
    }

    /// Planar distance to a point, in coordinate degrees.
    ///
    /// The catalog works at city scale where the flat-earth approximation
    /// is acceptable; 1 degree ≈ 111.32 km.
    pub fn degree_distance(&self, latitude: f64, longitude: f64) -> f64 {
        let dlat = self.latitude - latitude;
        let dlon = self.longitude - longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

impl Entity for Location {
    type Id = LocationId;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        let bad_lat = Location::new(
            LocationId::new(),
            "Spot",
            "",
            91.0,
            0.0,
            LocationType::Lake,
            WaveIntensity::None,
            WaterCleanliness::Good,
        );
        assert!(bad_lat.is_err());

        let bad_lon = Location::new(
            LocationId::new(),
            "Spot",
            "",
            0.0,
            -181.0,
            LocationType::Lake,
            WaveIntensity::None,
            WaterCleanliness::Good,
        );
        assert!(bad_lon.is_err());
    }

    #[test]
    fn degree_distance_is_zero_at_the_same_point() {
        let spot = Location::new(
            LocationId::new(),
            "Spot",
            "",
            45.0,
            15.0,
            LocationType::Park,
            WaveIntensity::None,
            WaterCleanliness::Good,
        )
        .unwrap();

        assert_eq!(spot.degree_distance(45.0, 15.0), 0.0);
        assert!(spot.degree_distance(45.1, 15.0) > 0.0);
    }
}
