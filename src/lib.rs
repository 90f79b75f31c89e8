//! Travel assistant backend
//!
//! Finds ticketed events near a destination, resolves free-text places to
//! coordinates and extracts geocoded attractions with a language model, and
//! assembles everything into a trip plan with map markers and pictures.

pub mod api;
pub mod attractions;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod images;
pub mod llm;
pub mod location_resolver;
pub mod logging;
pub mod map;
pub mod models;
pub mod planner;
pub mod session;
pub mod trip;
pub mod web;

// Re-export core types for public API
pub use attractions::{AttractionExtraction, AttractionExtractor};
pub use config::AssistantConfig;
pub use error::TravelAssistantError;
pub use events::EventFetcher;
pub use images::ImageSearch;
pub use llm::{ChatModel, OpenAiChatModel};
pub use location_resolver::LocationResolver;
pub use map::{MapView, Marker, MarkerIcon};
pub use models::{AttractionRecord, Coordinates, EventBatch, EventRecord, LocationResolution};
pub use planner::{TripPlan, TripPlanner, TripRequest};
pub use session::{PlanSession, QueryToken};
pub use trip::{Season, TripDates};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelAssistantError>;
