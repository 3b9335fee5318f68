//! Response cache in front of a geocoder
//!
//! Identical queries are common across chat replies ("Louvre, Paris, France"),
//! and every avoided request counts against the service's rate limit.

use anyhow::Result;
use async_trait::async_trait;
use rand::RngExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::Geocoder;
use crate::cache::PersistentCache;
use crate::models::GeocodeCandidate;

pub struct CachedGeocoder {
    inner: Arc<dyn Geocoder>,
    cache: PersistentCache,
    ttl: Duration,
}

impl CachedGeocoder {
    #[must_use]
    pub fn new(inner: Arc<dyn Geocoder>, cache: PersistentCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(query: &str, limit: usize) -> String {
        format!("geocode:{limit}:{}", query.trim().to_lowercase())
    }

    /// TTL spread by ±10% so entries written together do not expire together
    fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        self.ttl.mul_f64(jitter)
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<GeocodeCandidate>> {
        let key = Self::cache_key(query, limit);

        match self.cache.get::<Vec<GeocodeCandidate>>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!("Geocode cache read failed for '{}': {}", query, e),
        }

        let candidates = self.inner.search(query, limit).await?;

        // empty answers are often transient, only cache real matches
        if !candidates.is_empty() {
            if let Err(e) = self
                .cache
                .put(&key, candidates.clone(), self.jittered_ttl())
                .await
            {
                warn!("Geocode cache write failed for '{}': {}", query, e);
            }
        }

        Ok(candidates)
    }
}
