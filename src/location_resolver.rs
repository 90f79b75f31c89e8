//! Location Resolution Module
//!
//! Resolves free-text destinations (possibly misspelled or informal) into a
//! corrected place name with coordinates by asking the language model to tag
//! the text against the `Location` schema.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::llm::schema::{LOCATION_FUNCTION, location_function};
use crate::llm::{ChatModel, ChatRequest};
use crate::models::{Coordinates, LocationResolution};
use crate::{Result, TravelAssistantError};

const TAGGING_INSTRUCTION: &str = "Think carefully, and then tag the text as required";

/// Service for resolving location inputs
#[derive(Clone)]
pub struct LocationResolver {
    model: Arc<dyn ChatModel>,
}

#[derive(Debug, Deserialize)]
struct TaggedLocation {
    location: String,
    latitude: f64,
    longitude: f64,
}

impl LocationResolver {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Resolve free text into a structured location
    #[instrument(skip(self))]
    pub async fn resolve_location(&self, raw_text: &str) -> Result<LocationResolution> {
        let raw_text = raw_text.trim();
        if raw_text.is_empty() {
            return Err(TravelAssistantError::validation("Location cannot be empty"));
        }

        let request =
            ChatRequest::prompt(TAGGING_INSTRUCTION, raw_text).with_function(location_function());
        let completion = self.model.complete(request).await?;
        let arguments = completion.function_arguments(LOCATION_FUNCTION)?;
        let resolution = parse_location(arguments)?;

        debug!(
            "Resolved location: {} at ({}, {})",
            resolution.location, resolution.latitude, resolution.longitude
        );
        Ok(resolution)
    }
}

/// Decode `Location` function arguments, range checking the coordinates
fn parse_location(arguments: serde_json::Value) -> Result<LocationResolution> {
    let tagged: TaggedLocation = serde_json::from_value(arguments).map_err(|e| {
        TravelAssistantError::malformed(format!("Location response is incomplete: {e}"))
    })?;
    let coordinates = Coordinates::checked(tagged.latitude, tagged.longitude)?;
    Ok(LocationResolution {
        location: tagged.location,
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
    })
}
