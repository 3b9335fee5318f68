//! Place models: mentions, geocoder candidates and resolved places

use serde::{Deserialize, Serialize};

/// A span of source text marked as naming a real-world place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceMention {
    /// Trimmed span content
    pub name: String,
    /// Sentence the span was found in
    pub source_sentence: String,
}

/// Structured address fields returned with a geocoder candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub country: Option<String>,
}

impl AddressDetails {
    /// First present locality field (city, town, village, municipality)
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.municipality.as_deref())
    }
}

/// One match returned by the geocoding service for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Human-readable, comma-separated display name
    pub display_name: String,
    /// Structured address, empty when the service did not provide one
    pub address: AddressDetails,
}

impl GeocodeCandidate {
    /// Leading comma segment of the display name, usually the feature's own name
    #[must_use]
    pub fn primary_name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

/// Whether a marker is the trip destination or a place inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceCategory {
    Destination,
    PointOfInterest,
}

/// A place mention verified against the geocoding service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    /// Name as it was mentioned in the text
    pub place_name: String,
    /// (latitude, longitude)
    pub position: (f64, f64),
    /// Display name of the accepted candidate
    pub display_address: String,
    /// One-sentence description extracted from the source text
    pub description: Option<String>,
    pub category: PlaceCategory,
    /// Name of the feature actually matched when a fallback tier substituted it
    pub matched_name: Option<String>,
}

impl ResolvedPlace {
    /// Build a point of interest from an accepted candidate
    #[must_use]
    pub fn point_of_interest(place_name: &str, candidate: &GeocodeCandidate) -> Self {
        Self {
            place_name: place_name.to_string(),
            position: (candidate.latitude, candidate.longitude),
            display_address: candidate.display_name.clone(),
            description: None,
            category: PlaceCategory::PointOfInterest,
            matched_name: None,
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.position.0
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.position.1
    }

    /// Title shown on the marker, including the substituted feature name if any
    #[must_use]
    pub fn title(&self) -> String {
        match &self.matched_name {
            Some(matched) => format!("{} ({matched})", self.place_name),
            None => self.place_name.clone(),
        }
    }

    /// Plain popup text: title followed by the full address
    #[must_use]
    pub fn popup_text(&self) -> String {
        format!("{}\n{}", self.title(), self.display_address)
    }
}

/// The trip destination as understood by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// What the user typed, e.g. "Paris, France"
    pub query: String,
    /// Locality used for query building and locality filtering
    pub city: String,
    /// Country used for query building and locality filtering
    pub country: String,
}

impl Destination {
    #[must_use]
    pub fn new(query: impl Into<String>, city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            city: city.into(),
            country: country.into(),
        }
    }

    /// Derive city and country from free input like "Paris, France".
    ///
    /// The first comma segment is taken as the city and the last one as the
    /// country; a single segment is used for both.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let segments: Vec<&str> = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let city = segments.first().copied().unwrap_or_default();
        let country = segments.last().copied().unwrap_or_default();
        Self::new(input.trim(), city, country)
    }

    /// Prefer the structured address of the geocoded destination, keeping the
    /// input-derived value for any missing field
    #[must_use]
    pub fn refined_by(mut self, address: &AddressDetails) -> Self {
        if let Some(locality) = address.locality() {
            self.city = locality.to_string();
        }
        if let Some(country) = &address.country {
            self.country = country.clone();
        }
        self
    }
}
