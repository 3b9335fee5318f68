//! Geocoding service integration
//!
//! The resolver only sees the [`Geocoder`] trait: a free-text search returning
//! zero or more candidates. Implementations:
//! - [`NominatimClient`]: HTTP client for Nominatim-compatible services
//! - [`CachedGeocoder`]: persistent response cache in front of another geocoder

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::PersistentCache;
use crate::config::LawanderConfig;
use crate::models::GeocodeCandidate;

pub mod cached;
pub mod nominatim;

pub use cached::CachedGeocoder;
pub use nominatim::NominatimClient;

/// Free-text place search
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Search for `query`, returning at most `limit` candidates in the
    /// service's own relevance order
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<GeocodeCandidate>>;
}

/// Build the configured geocoder: Nominatim, behind the response cache when
/// `cache.enabled` is set
pub fn from_config(config: &LawanderConfig) -> Result<Arc<dyn Geocoder>> {
    let client: Arc<dyn Geocoder> = Arc::new(NominatimClient::new(&config.geocoder)?);
    if !config.cache.enabled {
        return Ok(client);
    }

    let cache = PersistentCache::open(&config.cache.location)
        .with_context(|| format!("Failed to open geocode cache at {}", config.cache.location))?;
    info!("Geocode cache enabled at {}", config.cache.location);
    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
    Ok(Arc::new(CachedGeocoder::new(client, cache, ttl)))
}
