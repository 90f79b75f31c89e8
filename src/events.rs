//! Ticketed event search
//!
//! Queries the Ticketmaster Discovery API for events in a city on a given
//! date and turns the payload into a deduplicated, bounded list of events
//! that carry venue coordinates.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use crate::config::TicketingConfig;
use crate::models::{DropReason, EventBatch, EventRecord};
use crate::{Result, TravelAssistantError};

/// Default cap on events returned by one fetch
pub const DEFAULT_MAX_RESULTS: usize = 20;
/// Largest page size sent to the ticketing API
pub const MAX_RESULTS_LIMIT: usize = 200;

/// Client for the ticketing search endpoint
#[derive(Clone)]
pub struct EventFetcher {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl EventFetcher {
    /// Create a fetcher with an explicit API key
    ///
    /// Fails with a configuration error when the key is blank, so no request
    /// is ever sent without credentials.
    pub fn new(client: Client, api_key: impl Into<String>, config: &TicketingConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TravelAssistantError::config("ticketing API key is missing"));
        }
        Ok(Self {
            client,
            api_key,
            endpoint: config.base_url.clone(),
            timeout: config.timeout(),
        })
    }

    /// Create a fetcher using the key from the configuration
    pub fn from_config(client: Client, config: &TicketingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TravelAssistantError::config("ticketing API key is missing"))?;
        Self::new(client, api_key, config)
    }

    /// Fetch events, failing open.
    ///
    /// Any failure is logged and yields an empty list, so an empty result
    /// means either "no events" or "fetch failed".
    pub async fn fetch_events(
        &self,
        location: &str,
        topic: &str,
        date: NaiveDate,
        max_results: usize,
    ) -> Vec<EventRecord> {
        match self.try_fetch_events(location, topic, date, max_results).await {
            Ok(batch) => batch.events,
            Err(e) => {
                error!("Request error: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch events, reporting failures and filter counts to the caller
    #[instrument(skip(self), fields(location = %location, topic = %topic, date = %date))]
    pub async fn try_fetch_events(
        &self,
        location: &str,
        topic: &str,
        date: NaiveDate,
        max_results: usize,
    ) -> Result<EventBatch> {
        if max_results == 0 {
            return Err(TravelAssistantError::validation(
                "max_results must be a positive number",
            ));
        }
        if max_results > MAX_RESULTS_LIMIT {
            return Err(TravelAssistantError::validation(format!(
                "max_results cannot exceed {MAX_RESULTS_LIMIT}"
            )));
        }

        let start_date_time = format!("{}T00:00:00Z", date.format("%Y-%m-%d"));
        let size = max_results.to_string();

        debug!("Ticketing API request to {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("keyword", topic),
                ("locale", "*"),
                ("startDateTime", start_date_time.as_str()),
                ("city", location),
                ("size", size.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TravelAssistantError::transport(format!(
                "Ticketing API returned {status}"
            )));
        }

        let body = response.text().await?;
        let batch = parse_events(&body, max_results)?;

        info!("Events fetched: {}", batch.events.len());
        if batch.dropped() > 0 {
            debug!(
                malformed = batch.malformed,
                missing_coordinates = batch.missing_coordinates,
                duplicates = batch.duplicates,
                "Filtered upstream events"
            );
        }
        Ok(batch)
    }
}

/// Parse a Discovery API search body into a bounded, deduplicated batch.
///
/// A body that is not JSON, or whose `_embedded` block has the wrong shape,
/// is a `MalformedResponse`. A missing `_embedded.events` array is an empty
/// batch. Individual events that cannot be read are counted and skipped.
pub fn parse_events(body: &str, max_results: usize) -> Result<EventBatch> {
    let response: discovery::SearchResponse = serde_json::from_str(body).map_err(|e| {
        TravelAssistantError::malformed(format!("Failed to parse ticketing response: {e}"))
    })?;
    Ok(collect_events(response.into_events(), max_results))
}

fn collect_events(items: Vec<serde_json::Value>, max_results: usize) -> EventBatch {
    let mut batch = EventBatch::default();
    let mut seen = HashSet::new();

    for item in items {
        if batch.events.len() >= max_results {
            break;
        }

        // coordinates are checked before the name is claimed, so a later
        // duplicate with coordinates can still win over an earlier one without
        let record = match discovery::Event::from_value(item)
            .and_then(discovery::Event::into_record)
        {
            Ok(record) => record,
            Err(reason) => {
                batch.record_drop(reason);
                continue;
            }
        };

        if !seen.insert(record.name.clone()) {
            batch.record_drop(DropReason::DuplicateName);
            continue;
        }
        batch.events.push(record);
    }

    if batch.malformed > 0 {
        warn!("Skipped {} malformed events", batch.malformed);
    }
    batch
}

/// Ticketmaster Discovery API response structures
mod discovery {
    use serde::Deserialize;
    use serde_json::Value;

    use crate::models::{DropReason, EventRecord, UNKNOWN_VENUE};

    #[derive(Debug, Deserialize)]
    pub struct SearchResponse {
        #[serde(rename = "_embedded")]
        pub embedded: Option<SearchEmbedded>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SearchEmbedded {
        #[serde(default)]
        pub events: Vec<Value>,
    }

    impl SearchResponse {
        pub fn into_events(self) -> Vec<Value> {
            self.embedded.map(|e| e.events).unwrap_or_default()
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct Event {
        pub name: String,
        #[serde(rename = "_embedded")]
        pub embedded: Option<EventEmbedded>,
    }

    #[derive(Debug, Deserialize)]
    pub struct EventEmbedded {
        #[serde(default)]
        pub venues: Vec<Venue>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Venue {
        pub name: Option<String>,
        pub location: Option<GeoPoint>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeoPoint {
        pub latitude: Option<Coordinate>,
        pub longitude: Option<Coordinate>,
    }

    /// The API sends coordinates as strings, numbers are accepted as well
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum Coordinate {
        Number(f64),
        Text(String),
    }

    impl Coordinate {
        /// `Ok(None)` for a blank value, `Err` for text that is not a finite number
        fn value(&self) -> Result<Option<f64>, DropReason> {
            let value = match self {
                Coordinate::Number(n) => *n,
                Coordinate::Text(text) if text.trim().is_empty() => return Ok(None),
                Coordinate::Text(text) => text
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| DropReason::Malformed)?,
            };
            if value.is_finite() {
                Ok(Some(value))
            } else {
                Err(DropReason::Malformed)
            }
        }
    }

    impl Event {
        pub fn from_value(value: Value) -> Result<Self, DropReason> {
            serde_json::from_value(value).map_err(|_| DropReason::Malformed)
        }

        pub fn into_record(self) -> Result<EventRecord, DropReason> {
            let venue = self
                .embedded
                .and_then(|embedded| embedded.venues.into_iter().next());

            let (venue_name, location) = match venue {
                Some(venue) => (venue.name, venue.location),
                None => (None, None),
            };

            let (latitude, longitude) = match location {
                Some(GeoPoint {
                    latitude: Some(lat),
                    longitude: Some(lon),
                }) => (lat.value()?, lon.value()?),
                _ => (None, None),
            };

            match (latitude, longitude) {
                (Some(latitude), Some(longitude)) => Ok(EventRecord {
                    name: self.name,
                    venue_name: venue_name.unwrap_or_else(|| UNKNOWN_VENUE.to_string()),
                    latitude,
                    longitude,
                }),
                _ => Err(DropReason::MissingCoordinates),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_VENUE;
    use rstest::rstest;
    use serde_json::json;

    fn event(name: &str, lat: Option<&str>, lon: Option<&str>) -> serde_json::Value {
        json!({
            "name": name,
            "_embedded": {
                "venues": [{
                    "name": format!("{name} Hall"),
                    "location": { "latitude": lat, "longitude": lon }
                }]
            }
        })
    }

    fn payload(events: Vec<serde_json::Value>) -> String {
        json!({ "_embedded": { "events": events } }).to_string()
    }

    #[test]
    fn test_three_unique_events_keep_order() {
        let body = payload(vec![
            event("Alpha", Some("40.71"), Some("-74.00")),
            event("Beta", Some("40.75"), Some("-73.99")),
            event("Gamma", Some("40.68"), Some("-73.97")),
        ]);

        let batch = parse_events(&body, 20).unwrap();
        let names: Vec<_> = batch.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(batch.events[1].venue_name, "Beta Hall");
        assert_eq!(batch.events[1].latitude, 40.75);
        assert_eq!(batch.events[1].longitude, -73.99);
        assert_eq!(batch.dropped(), 0);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let body = payload(vec![
            event("Same", Some("1.0"), Some("2.0")),
            event("Same", Some("3.0"), Some("4.0")),
            event("Same", Some("5.0"), Some("6.0")),
        ]);

        let batch = parse_events(&body, 20).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].latitude, 1.0);
        assert_eq!(batch.duplicates, 2);
    }

    #[test]
    fn test_missing_coordinates_excluded() {
        let body = payload(vec![
            event("No Lat", None, Some("2.0")),
            event("No Lon", Some("1.0"), None),
            event("Blank", Some(""), Some("2.0")),
            json!({ "name": "No Venue" }),
            event("Ok", Some("1.0"), Some("2.0")),
        ]);

        let batch = parse_events(&body, 20).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].name, "Ok");
        assert_eq!(batch.missing_coordinates, 4);
    }

    #[test]
    fn test_duplicate_after_missing_coordinates_is_kept() {
        let body = payload(vec![
            event("Show", None, None),
            event("Show", Some("1.0"), Some("2.0")),
        ]);

        let batch = parse_events(&body, 20).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.duplicates, 0);
    }

    #[test]
    fn test_never_more_than_max_results() {
        let events = (0..30)
            .map(|i| event(&format!("Event {i}"), Some("1.0"), Some("2.0")))
            .collect();
        let batch = parse_events(&payload(events), 20).unwrap();
        assert_eq!(batch.events.len(), 20);
        assert_eq!(batch.events[19].name, "Event 19");

        let events = (0..5)
            .map(|i| event(&format!("Event {i}"), Some("1.0"), Some("2.0")))
            .collect();
        let batch = parse_events(&payload(events), 3).unwrap();
        assert_eq!(batch.events.len(), 3);
    }

    #[test]
    fn test_absent_events_is_empty() {
        let batch = parse_events(r#"{"page": {"size": 20}}"#, 20).unwrap();
        assert!(batch.events.is_empty());

        let batch = parse_events(r#"{"_embedded": {}}"#, 20).unwrap();
        assert!(batch.events.is_empty());
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let body = payload(vec![
            json!({ "id": "no-name" }),
            json!({ "name": 42 }),
            event("Bad Number", Some("north"), Some("2.0")),
            json!("not an object"),
            event("Good", Some("1.0"), Some("2.0")),
        ]);

        let batch = parse_events(&body, 20).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.malformed, 4);
    }

    #[test]
    fn test_numeric_coordinates_and_unknown_venue() {
        let body = payload(vec![json!({
            "name": "Numbers",
            "_embedded": { "venues": [{ "location": { "latitude": 48.85, "longitude": 2.35 } }] }
        })]);

        let batch = parse_events(&body, 20).unwrap();
        assert_eq!(batch.events[0].venue_name, UNKNOWN_VENUE);
        assert_eq!(batch.events[0].latitude, 48.85);
    }

    #[rstest]
    #[case("NaN", "2.35")]
    #[case("48.85", "inf")]
    #[case("-infinity", "2.35")]
    fn test_non_finite_coordinates_are_malformed(#[case] lat: &str, #[case] lon: &str) {
        let body = payload(vec![
            event("Nowhere", Some(lat), Some(lon)),
            event("Somewhere", Some("48.85"), Some("2.35")),
        ]);

        let batch = parse_events(&body, 20).unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].name, "Somewhere");
        assert_eq!(batch.malformed, 1);
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = parse_events("<html>oops</html>", 20).unwrap_err();
        assert!(matches!(err, TravelAssistantError::MalformedResponse { .. }));
    }

    #[test]
    fn test_blank_api_key_is_configuration_error() {
        let config = TicketingConfig::default();
        let result = EventFetcher::new(Client::new(), "  ", &config);
        assert!(matches!(result, Err(TravelAssistantError::Config { .. })));

        let result = EventFetcher::from_config(Client::new(), &config);
        assert!(matches!(result, Err(TravelAssistantError::Config { .. })));
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_RESULTS_LIMIT + 1)]
    #[case(10_000)]
    #[tokio::test]
    async fn test_max_results_out_of_range_is_rejected(#[case] max_results: usize) {
        let config = TicketingConfig {
            base_url: "http://127.0.0.1:9/events.json".to_string(),
            ..TicketingConfig::default()
        };
        let fetcher = EventFetcher::new(Client::new(), "key", &config).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();

        let result = fetcher
            .try_fetch_events("Berlin", "rock", date, max_results)
            .await;
        assert!(matches!(result, Err(TravelAssistantError::Validation { .. })));
    }
}
