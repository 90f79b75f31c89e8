//! Data models for the travel assistant
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and the resolved destination
//! - Event: ticketed events with venue coordinates
//! - Attraction: points of interest extracted by the model

pub mod attraction;
pub mod event;
pub mod location;

// Re-export all public types for convenient access
pub use attraction::{AttractionGroup, AttractionRecord};
pub use event::{DropReason, EventBatch, EventRecord, UNKNOWN_VENUE};
pub use location::{Coordinates, LocationResolution};
