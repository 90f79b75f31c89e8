//! Tourist attractions for a destination
//!
//! A free-text call suggests the top attractions of a place, one per line.
//! Each line is then geocoded by its own structured-extraction call; the calls
//! run concurrently and a failing line is dropped without affecting the rest.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::llm::schema::{INFORMATION_FUNCTION, information_function};
use crate::llm::{ChatModel, ChatRequest};
use crate::models::{AttractionGroup, AttractionRecord, Coordinates};
use crate::{Result, TravelAssistantError};

const GUIDE_INSTRUCTION: &str = "You are a helpful travel assistant";
const EXTRACTION_INSTRUCTION: &str =
    "Extract the relevant information, if not explicitly provided do not guess. Extract partial info";

/// Per-line extraction results of one block
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttractionExtraction {
    /// Successful lines, in input order
    pub groups: Vec<AttractionGroup>,
    /// Lines whose call failed, timed out or returned an unusable payload
    pub failed_lines: usize,
}

impl AttractionExtraction {
    /// All extracted attractions flattened, in input line order
    #[must_use]
    pub fn attractions(&self) -> Vec<AttractionRecord> {
        self.groups
            .iter()
            .flat_map(|group| group.attractions.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct Information {
    attractions: Vec<CandidateAttraction>,
}

/// Partial extraction: any field may be left out by the model
#[derive(Debug, Deserialize)]
struct CandidateAttraction {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl CandidateAttraction {
    fn into_record(self) -> Option<AttractionRecord> {
        let name = self.name.filter(|name| !name.trim().is_empty())?;
        let coordinates = Coordinates::checked(self.latitude?, self.longitude?).ok()?;
        Some(AttractionRecord {
            name,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        })
    }
}

/// Suggests and geocodes attractions through the language model
#[derive(Clone)]
pub struct AttractionExtractor {
    model: Arc<dyn ChatModel>,
    line_timeout: Duration,
}

impl AttractionExtractor {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, line_timeout: Duration) -> Self {
        Self {
            model,
            line_timeout,
        }
    }

    /// Ask for the top 10 tourist attraction names of a place, one per line
    #[instrument(skip(self))]
    pub async fn suggest_attractions(&self, location: &str) -> Result<String> {
        let location = location.trim();
        if location.is_empty() {
            return Err(TravelAssistantError::validation("Location cannot be empty"));
        }
        let request = ChatRequest::prompt(
            GUIDE_INSTRUCTION,
            format!(
                "Give me the top 10 touristic attractions names in {location}. Do not add comments."
            ),
        );
        let completion = self.model.complete(request).await?;
        Ok(completion.text()?.to_string())
    }

    /// Geocode every line of `text`, flattening the results
    pub async fn extract_attractions(&self, text: &str) -> Vec<AttractionRecord> {
        self.extract_attraction_groups(text).await.attractions()
    }

    /// Geocode every non-blank line of `text` concurrently.
    ///
    /// Groups come back in input order. A line whose call fails is counted in
    /// `failed_lines` and has no group.
    #[instrument(skip(self, text))]
    pub async fn extract_attraction_groups(&self, text: &str) -> AttractionExtraction {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        debug!("Extracting attractions from {} lines", lines.len());

        let results = join_all(lines.iter().map(|line| self.extract_line_bounded(line))).await;

        let mut extraction = AttractionExtraction::default();
        for (line, result) in lines.into_iter().zip(results) {
            match result {
                Ok(attractions) => extraction.groups.push(AttractionGroup {
                    line: line.to_string(),
                    attractions,
                }),
                Err(e) => {
                    warn!("Dropping attraction line '{}': {}", line, e);
                    extraction.failed_lines += 1;
                }
            }
        }

        info!(
            "Extracted {} attractions from {} lines ({} failed)",
            extraction.attractions().len(),
            extraction.groups.len() + extraction.failed_lines,
            extraction.failed_lines
        );
        extraction
    }

    async fn extract_line_bounded(&self, line: &str) -> Result<Vec<AttractionRecord>> {
        tokio::time::timeout(self.line_timeout, self.extract_line(line))
            .await
            .map_err(|_| TravelAssistantError::timeout(format!("attraction extraction for '{line}'")))?
    }

    async fn extract_line(&self, line: &str) -> Result<Vec<AttractionRecord>> {
        let request =
            ChatRequest::prompt(EXTRACTION_INSTRUCTION, line).with_function(information_function());
        let completion = self.model.complete(request).await?;
        let arguments = completion.function_arguments(INFORMATION_FUNCTION)?;
        let information: Information = serde_json::from_value(arguments).map_err(|e| {
            TravelAssistantError::malformed(format!("Information response is incomplete: {e}"))
        })?;

        Ok(information
            .attractions
            .into_iter()
            .filter_map(CandidateAttraction::into_record)
            .collect())
    }
}
