//! Tourist attraction model

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttractionRecord {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Attractions extracted from a single input line
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttractionGroup {
    /// The input line the model was asked about
    pub line: String,
    pub attractions: Vec<AttractionRecord>,
}
