//! Lawander - place resolution and map annotation for AI-generated travel text
//!
//! Turns free-text replies of a chat backend into verified map markers: marked
//! place names are extracted, resolved against a rate-limited geocoding
//! service with locality filtering and fallback tiers, deduplicated, and
//! rendered back as highlighted text and day-by-day itineraries.

pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod marker_store;
pub mod models;
pub mod resolver;
pub mod session;
pub mod telemetry;
pub mod text;
pub mod web;

// Re-export core types for public API
pub use chat::{ChatBackend, OpenAiChat};
pub use config::LawanderConfig;
pub use error::LawanderError;
pub use geocoding::{CachedGeocoder, Geocoder, NominatimClient};
pub use marker_store::MarkerStore;
pub use models::{Destination, GeocodeCandidate, MarkerView, PlaceMention, ResolvedPlace};
pub use resolver::{BatchScheduler, Resolution, Resolver};
pub use session::{ChatMessage, TripSession, TripSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, LawanderError>;
