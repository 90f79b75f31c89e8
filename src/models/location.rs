//! Location model for geographic coordinates and the resolved destination

use serde::{Deserialize, Serialize};

use crate::{Result, TravelAssistantError};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build coordinates, rejecting values outside the valid degree ranges
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TravelAssistantError::malformed(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TravelAssistantError::malformed(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self::new(latitude, longitude))
    }
}

/// Destination as tagged by the language model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationResolution {
    /// Possibly corrected or expanded place name, replaces the raw input
    pub location: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl LocationResolution {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
