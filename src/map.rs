//! Map markers and viewport for the rendering collaborator

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::models::{AttractionRecord, Coordinates, EventRecord};

/// Center used before any destination is resolved (Paris)
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: 48.8566,
    longitude: 2.3522,
};
pub const DEFAULT_ZOOM: u8 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarkerIcon {
    #[serde(rename = "icon_event")]
    Event,
    #[serde(rename = "icon_attraction")]
    Attraction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    /// (latitude, longitude)
    pub location: (f64, f64),
    pub label: String,
    pub icon: MarkerIcon,
}

impl Marker {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.location.0, self.location.1)
    }
}

impl From<&EventRecord> for Marker {
    fn from(event: &EventRecord) -> Self {
        Self {
            location: (event.latitude, event.longitude),
            label: event.name.clone(),
            icon: MarkerIcon::Event,
        }
    }
}

impl From<&AttractionRecord> for Marker {
    fn from(attraction: &AttractionRecord) -> Self {
        Self {
            location: (attraction.latitude, attraction.longitude),
            label: attraction.name.clone(),
            icon: MarkerIcon::Attraction,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapView {
    /// Center on `center` and zoom out far enough to show every marker
    #[must_use]
    pub fn fit(center: Coordinates, markers: &[Marker]) -> Self {
        let farthest_km = markers
            .iter()
            .map(|marker| distance_km(&center, &marker.coordinates()))
            .fold(0.0_f64, f64::max);

        let zoom = if markers.is_empty() {
            DEFAULT_ZOOM
        } else {
            zoom_for_radius(farthest_km)
        };
        Self { center, zoom }
    }
}

fn distance_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let from = HaversineLocation {
        latitude: from.latitude,
        longitude: from.longitude,
    };
    let to = HaversineLocation {
        latitude: to.latitude,
        longitude: to.longitude,
    };
    distance(from, to, Units::Kilometers)
}

/// Slippy-map zoom level whose viewport roughly covers `radius_km`
fn zoom_for_radius(radius_km: f64) -> u8 {
    match radius_km {
        r if r <= 2.0 => 14,
        r if r <= 5.0 => 13,
        r if r <= 10.0 => 12,
        r if r <= 20.0 => 11,
        r if r <= 40.0 => 10,
        r if r <= 80.0 => 9,
        r if r <= 160.0 => 8,
        r if r <= 320.0 => 7,
        r if r <= 640.0 => 6,
        r if r <= 1280.0 => 5,
        _ => 4,
    }
}

/// Markers for events and attractions, events first
#[must_use]
pub fn build_markers(events: &[EventRecord], attractions: &[AttractionRecord]) -> Vec<Marker> {
    events
        .iter()
        .map(Marker::from)
        .chain(attractions.iter().map(Marker::from))
        .collect()
}
