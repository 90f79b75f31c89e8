//! Trip planning
//!
//! Turns one [`TripRequest`] into one [`TripPlan`]: the destination is
//! resolved first, then attractions, events and pictures are gathered
//! concurrently. Each branch fails on its own and leaves a warning in the
//! plan instead of failing the request.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::attractions::{AttractionExtraction, AttractionExtractor};
use crate::events::{DEFAULT_MAX_RESULTS, EventFetcher};
use crate::images::ImageSearch;
use crate::location_resolver::LocationResolver;
use crate::map::{MapView, Marker, build_markers};
use crate::models::{AttractionRecord, EventBatch, EventRecord, LocationResolution};
use crate::session::QueryToken;
use crate::trip::{Hemisphere, Season, TripDates};
use crate::{Result, TravelAssistantError};

/// Everything the UI knows when it asks for a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRequest {
    /// Destination as typed by the user
    pub location: String,
    /// Event search keyword
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub dates: Option<TripDates>,
    #[serde(default)]
    pub include_events: bool,
    #[serde(default)]
    pub max_events: Option<usize>,
}

impl TripRequest {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            topic: String::new(),
            dates: None,
            include_events: false,
            max_events: None,
        }
    }

    /// Builder: request events for a keyword
    #[must_use]
    pub fn with_events(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self.include_events = true;
        self
    }

    #[must_use]
    pub fn with_dates(mut self, dates: TripDates) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Events are searched from the first travel day, or from today
    fn event_date(&self) -> NaiveDate {
        self.dates
            .map_or_else(|| Utc::now().date_naive(), |dates| dates.start)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripPlan {
    /// Resolved place name, or the raw input when resolution failed
    pub location: String,
    pub resolution: Option<LocationResolution>,
    pub trip_summary: Option<String>,
    pub season: Option<Season>,
    /// Raw attraction list as suggested by the model
    pub suggested_attractions: Option<String>,
    pub attractions: Vec<AttractionRecord>,
    pub failed_attraction_lines: usize,
    pub events: Vec<EventRecord>,
    pub filtered_events: usize,
    pub images: Vec<String>,
    pub markers: Vec<Marker>,
    pub map: MapView,
    /// One entry per branch that failed
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct TripPlanner {
    resolver: LocationResolver,
    extractor: AttractionExtractor,
    events: Option<EventFetcher>,
    images: ImageSearch,
    default_max_events: usize,
}

impl TripPlanner {
    /// `events` is `None` when no ticketing key is available; event requests
    /// then produce a configuration warning.
    #[must_use]
    pub fn new(
        resolver: LocationResolver,
        extractor: AttractionExtractor,
        events: Option<EventFetcher>,
        images: ImageSearch,
    ) -> Self {
        Self {
            resolver,
            extractor,
            events,
            images,
            default_max_events: DEFAULT_MAX_RESULTS,
        }
    }

    #[must_use]
    pub fn with_default_max_events(mut self, max_events: usize) -> Self {
        self.default_max_events = max_events;
        self
    }

    /// Plan within a session query, giving up when a newer query starts
    pub async fn plan_in(&self, request: &TripRequest, token: &mut QueryToken) -> Result<TripPlan> {
        token.run(self.plan(request)).await
    }

    #[instrument(skip(self), fields(location = %request.location))]
    pub async fn plan(&self, request: &TripRequest) -> Result<TripPlan> {
        let raw_location = request.location.trim();
        if raw_location.is_empty() {
            return Err(TravelAssistantError::validation("Location cannot be empty"));
        }
        if let Some(dates) = request.dates {
            TripDates::new(dates.start, dates.end)?;
        }

        let mut warnings = Vec::new();

        let resolution = match self.resolver.resolve_location(raw_location).await {
            Ok(resolution) => Some(resolution),
            Err(e) => {
                warn!("Location resolution failed: {}", e);
                warnings.push(format!("location: {e}"));
                None
            }
        };
        let place = resolution
            .as_ref()
            .map_or_else(|| raw_location.to_string(), |r| r.location.clone());

        let hemisphere = resolution
            .as_ref()
            .map_or(Hemisphere::North, |r| Hemisphere::from_latitude(r.latitude));
        let season = request
            .dates
            .map(|dates| Season::for_date(dates.start, hemisphere));

        let (attractions, events, images) = tokio::join!(
            self.gather_attractions(&place),
            self.gather_events(&place, request),
            self.images.images_for(&place, season),
        );

        let (suggested_attractions, extraction) = match attractions {
            Ok((text, extraction)) => (Some(text), extraction),
            Err(e) => {
                warn!("Attraction suggestions failed: {}", e);
                warnings.push(format!("attractions: {e}"));
                (None, AttractionExtraction::default())
            }
        };
        if extraction.failed_lines > 0 {
            warnings.push(format!(
                "attractions: {} lines could not be geocoded",
                extraction.failed_lines
            ));
        }

        let batch = match events {
            Ok(batch) => batch.unwrap_or_default(),
            Err(e) => {
                warn!("Event search failed: {}", e);
                warnings.push(format!("events: {e}"));
                EventBatch::default()
            }
        };

        let attractions = extraction.attractions();
        let markers = build_markers(&batch.events, &attractions);
        let map = resolution
            .as_ref()
            .map_or_else(MapView::default, |r| MapView::fit(r.coordinates(), &markers));

        info!(
            "Planned trip to {}: {} attractions, {} events, {} images",
            place,
            attractions.len(),
            batch.events.len(),
            images.len()
        );

        Ok(TripPlan {
            location: place,
            resolution,
            trip_summary: request.dates.map(|dates| dates.summary()),
            season,
            suggested_attractions,
            attractions,
            failed_attraction_lines: extraction.failed_lines,
            filtered_events: batch.dropped(),
            events: batch.events,
            images,
            markers,
            map,
            warnings,
        })
    }

    async fn gather_attractions(&self, place: &str) -> Result<(String, AttractionExtraction)> {
        let text = self.extractor.suggest_attractions(place).await?;
        let extraction = self.extractor.extract_attraction_groups(&text).await;
        Ok((text, extraction))
    }

    async fn gather_events(&self, place: &str, request: &TripRequest) -> Result<Option<EventBatch>> {
        if !request.include_events {
            return Ok(None);
        }
        let fetcher = self
            .events
            .as_ref()
            .ok_or_else(|| TravelAssistantError::config("ticketing API key is missing"))?;
        let max_results = request.max_events.unwrap_or(self.default_max_events);
        fetcher
            .try_fetch_events(place, &request.topic, request.event_date(), max_results)
            .await
            .map(Some)
    }
}
