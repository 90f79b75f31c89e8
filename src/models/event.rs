//! Ticketed event model

use serde::{Deserialize, Serialize};

/// Venue name used when the payload does not carry one
pub const UNKNOWN_VENUE: &str = "Unknown Venue";

/// An event with its venue position
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EventRecord {
    /// Event name, unique within one fetch
    pub name: String,
    pub venue_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Why an upstream event did not make it into a batch
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The item could not be read as an event at all
    Malformed,
    MissingCoordinates,
    DuplicateName,
}

/// Result of one event fetch, with counts of what was filtered out
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct EventBatch {
    pub events: Vec<EventRecord>,
    pub malformed: usize,
    pub missing_coordinates: usize,
    pub duplicates: usize,
}

impl EventBatch {
    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::Malformed => self.malformed += 1,
            DropReason::MissingCoordinates => self.missing_coordinates += 1,
            DropReason::DuplicateName => self.duplicates += 1,
        }
    }

    /// Total number of upstream items that were filtered out
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.malformed + self.missing_coordinates + self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_drop_counts() {
        let mut batch = EventBatch::default();
        batch.record_drop(DropReason::DuplicateName);
        batch.record_drop(DropReason::DuplicateName);
        batch.record_drop(DropReason::MissingCoordinates);
        assert_eq!(batch.duplicates, 2);
        assert_eq!(batch.missing_coordinates, 1);
        assert_eq!(batch.dropped(), 3);
    }
}
