//! Travel dates and seasons

use std::fmt::Display;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Result, TravelAssistantError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    #[must_use]
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }
}

impl Season {
    /// Astronomical season, with the 21st of March, June, September and
    /// December as boundaries
    #[must_use]
    pub fn for_date(date: NaiveDate, hemisphere: Hemisphere) -> Self {
        let day = (date.month(), date.day());
        let northern = if day >= (3, 21) && day < (6, 21) {
            Season::Spring
        } else if day >= (6, 21) && day < (9, 21) {
            Season::Summer
        } else if day >= (9, 21) && day < (12, 21) {
            Season::Fall
        } else {
            Season::Winter
        };

        match hemisphere {
            Hemisphere::North => northern,
            Hemisphere::South => northern.opposite(),
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Season::Spring => Season::Fall,
            Season::Summer => Season::Winter,
            Season::Fall => Season::Spring,
            Season::Winter => Season::Summer,
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        };
        f.write_str(name)
    }
}

/// Inclusive travel date range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TripDates {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(TravelAssistantError::validation(format!(
                "Trip ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days between start and end
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Sentence describing the trip for display
    #[must_use]
    pub fn summary(&self) -> String {
        let days = self.days();
        let unit = if days == 1 { "day" } else { "days" };
        format!(
            "You are traveling for {days} {unit} from {} to {}.",
            self.start.format("%A, %d %B %Y"),
            self.end.format("%A, %d %B %Y")
        )
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        TravelAssistantError::validation(format!("'{value}' is not a YYYY-MM-DD date"))
    })
}
