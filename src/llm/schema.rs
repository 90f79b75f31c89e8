//! Function schemas bound to structured-output calls

use serde::Serialize;
use serde_json::{Value, json};

/// A function the model can be forced to call
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: Value,
}

pub const LOCATION_FUNCTION: &str = "Location";
pub const INFORMATION_FUNCTION: &str = "Information";

/// `Location { location, latitude, longitude }`
#[must_use]
pub fn location_function() -> FunctionSpec {
    FunctionSpec {
        name: LOCATION_FUNCTION.to_string(),
        description: "Tag the text with the information required".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "the location" },
                "latitude": { "type": "number", "description": "the latitude of the location" },
                "longitude": { "type": "number", "description": "the longitude of the location" }
            },
            "required": ["location", "latitude", "longitude"]
        }),
    }
}

/// `Information { attractions: [{ name, latitude, longitude }] }`
#[must_use]
pub fn information_function() -> FunctionSpec {
    FunctionSpec {
        name: INFORMATION_FUNCTION.to_string(),
        description: "Information to extract.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "attractions": {
                    "type": "array",
                    "description": "List of info about tourist attractions",
                    "items": {
                        "type": "object",
                        "description": "Information about a tourist attraction",
                        "properties": {
                            "name": { "type": "string", "description": "The name of the tourist attraction" },
                            "latitude": { "type": "number", "description": "the latitude of the tourist attraction" },
                            "longitude": { "type": "number", "description": "the longitude of the tourist attraction" }
                        },
                        "required": ["name", "latitude", "longitude"]
                    }
                }
            },
            "required": ["attractions"]
        }),
    }
}
