//! Nominatim search client
//!
//! Free-text search with structured address details. Transient HTTP failures
//! are retried by the middleware; everything else is reported to the caller,
//! which decides whether a failed query matters.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::Geocoder;
use crate::LawanderError;
use crate::config::GeocoderConfig;
use crate::models::GeocodeCandidate;

/// HTTP client for a Nominatim-compatible `/search` endpoint
pub struct NominatimClient {
    client: ClientWithMiddleware,
    base_url: String,
    accept_language: String,
}

impl NominatimClient {
    /// Create a new client
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.as_str())
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            accept_language: config.accept_language.clone(),
        })
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}/search?format=json&q={}&limit={}&addressdetails=1&accept-language={}",
            self.base_url,
            urlencoding::encode(query),
            limit,
            urlencoding::encode(&self.accept_language)
        )
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(name = "nominatim_search", level = "debug", skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<GeocodeCandidate>> {
        let start_time = Instant::now();
        let url = self.search_url(query, limit);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LawanderError::geocoding(format!("Request for '{query}' failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LawanderError::geocoding(format!(
                "Search for '{query}' returned HTTP {status}"
            ))
            .into());
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read search response for '{query}'"))?;
        let candidates = parse_search_response(&body)?;

        debug!(
            "'{}' -> {} candidates in {:.3}s",
            query,
            candidates.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(candidates)
    }
}

/// Parse a `format=json` search response.
///
/// Entries with unparsable coordinates are skipped rather than failing the
/// whole response.
pub fn parse_search_response(body: &str) -> Result<Vec<GeocodeCandidate>> {
    let results: Vec<raw::SearchResult> =
        serde_json::from_str(body).with_context(|| "Failed to parse Nominatim search response")?;

    Ok(results
        .into_iter()
        .filter_map(|result| {
            let display_name = result.display_name.clone();
            GeocodeCandidate::try_from(result)
                .map_err(|e| warn!("Skipping candidate '{}': {}", display_name, e))
                .ok()
        })
        .collect())
}

/// Nominatim JSON structures
mod raw {
    use serde::Deserialize;

    use crate::models::{AddressDetails, GeocodeCandidate};

    #[derive(Debug, Deserialize)]
    pub struct SearchResult {
        pub lat: String,
        pub lon: String,
        pub display_name: String,
        #[serde(default)]
        pub address: Option<Address>,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct Address {
        pub city: Option<String>,
        pub town: Option<String>,
        pub village: Option<String>,
        pub municipality: Option<String>,
        pub country: Option<String>,
    }

    impl From<Address> for AddressDetails {
        fn from(address: Address) -> Self {
            AddressDetails {
                city: address.city,
                town: address.town,
                village: address.village,
                municipality: address.municipality,
                country: address.country,
            }
        }
    }

    impl TryFrom<SearchResult> for GeocodeCandidate {
        type Error = std::num::ParseFloatError;

        fn try_from(result: SearchResult) -> Result<Self, Self::Error> {
            Ok(GeocodeCandidate {
                latitude: result.lat.trim().parse()?,
                longitude: result.lon.trim().parse()?,
                display_name: result.display_name,
                address: result.address.unwrap_or_default().into(),
            })
        }
    }
}
