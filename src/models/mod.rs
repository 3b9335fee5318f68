//! Data models for the Lawander engine
//!
//! This module contains the core domain models organized by concern:
//! - Place: mentions, geocoder candidates and resolved places
//! - Marker: presentation of resolved places for map renderers

pub mod marker;
pub mod place;

// Re-export all public types for convenient access
pub use marker::{MarkerView, PlaceKind};
pub use place::{
    AddressDetails, Destination, GeocodeCandidate, PlaceCategory, PlaceMention, ResolvedPlace,
};
