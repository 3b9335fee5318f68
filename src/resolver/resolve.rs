//! Per-place resolution
//!
//! One place walks the ordered query list, then the category fallback (museums
//! only), then the general fallback. Query failures never abort a resolution:
//! a failed, timed-out or empty query simply moves on to the next step.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::query::{build_queries, is_museum};
use super::scoring::{best_candidate, mentions_locality, passes_locality};
use crate::config::{FallbackLocality, ResolverConfig};
use crate::geocoding::Geocoder;
use crate::models::{Destination, GeocodeCandidate, PlaceCategory, ResolvedPlace};

/// Which step of the search produced the accepted candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum MatchTier {
    Query { index: usize, query: String },
    CategoryFallback,
    GeneralFallback,
}

/// Terminal outcome of resolving one place
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found { place: ResolvedPlace, tier: MatchTier },
    NotFound { place_name: String },
}

impl Resolution {
    #[must_use]
    pub fn into_place(self) -> Option<ResolvedPlace> {
        match self {
            Resolution::Found { place, .. } => Some(place),
            Resolution::NotFound { .. } => None,
        }
    }
}

#[derive(Debug)]
enum SearchState {
    Searching(usize),
    Exhausted,
    CategoryFallback,
    GeneralFallback,
    Found(ResolvedPlace, MatchTier),
    NotFound,
}

/// Resolves place names against a geocoder
#[derive(Clone)]
pub struct Resolver {
    geocoder: Arc<dyn Geocoder>,
    config: ResolverConfig,
}

impl Resolver {
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, config: ResolverConfig) -> Self {
        Self { geocoder, config }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run one query; transport errors and timeouts count as zero candidates
    async fn query(&self, query: &str, limit: usize) -> Vec<GeocodeCandidate> {
        match timeout(self.config.query_timeout(), self.geocoder.search(query, limit)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!("Query '{}' failed: {:#}", query, e);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "Query '{}' timed out after {}s",
                    query, self.config.query_timeout_seconds
                );
                Vec::new()
            }
        }
    }

    /// Resolve one place inside `destination`.
    ///
    /// `taken` holds markers already accepted; the category fallback will not
    /// hand out a feature one of them already shows.
    #[instrument(skip(self, destination, taken), fields(city = %destination.city))]
    pub async fn resolve(
        &self,
        place_name: &str,
        destination: &Destination,
        taken: &[ResolvedPlace],
    ) -> Resolution {
        let queries = build_queries(place_name, &destination.city, &destination.country);
        self.search(place_name, destination, taken, &queries, SearchState::Searching(0))
            .await
    }

    /// Rerun the category fallback, and the general fallback after it, for a
    /// museum whose category match was claimed by another place meanwhile
    #[instrument(skip(self, destination, taken), fields(city = %destination.city))]
    pub async fn resolve_category_again(
        &self,
        place_name: &str,
        destination: &Destination,
        taken: &[ResolvedPlace],
    ) -> Resolution {
        self.search(place_name, destination, taken, &[], SearchState::CategoryFallback)
            .await
    }

    async fn search(
        &self,
        place_name: &str,
        destination: &Destination,
        taken: &[ResolvedPlace],
        queries: &[String],
        mut state: SearchState,
    ) -> Resolution {
        loop {
            state = match state {
                SearchState::Searching(index) => match queries.get(index) {
                    Some(query) => {
                        let candidates = self.query(query, self.config.query_limit).await;
                        match best_candidate(&candidates, place_name, destination) {
                            Some(candidate) => SearchState::Found(
                                ResolvedPlace::point_of_interest(place_name, candidate),
                                MatchTier::Query {
                                    index,
                                    query: query.clone(),
                                },
                            ),
                            None => SearchState::Searching(index + 1),
                        }
                    }
                    None => SearchState::Exhausted,
                },
                SearchState::Exhausted => {
                    debug!("All {} queries exhausted for '{}'", queries.len(), place_name);
                    if is_museum(place_name) {
                        SearchState::CategoryFallback
                    } else {
                        SearchState::GeneralFallback
                    }
                }
                SearchState::CategoryFallback => {
                    match self.category_fallback(place_name, destination, taken).await {
                        Some(place) => SearchState::Found(place, MatchTier::CategoryFallback),
                        None => SearchState::GeneralFallback,
                    }
                }
                SearchState::GeneralFallback => {
                    match self.general_fallback(place_name, destination).await {
                        Some(place) => SearchState::Found(place, MatchTier::GeneralFallback),
                        None => SearchState::NotFound,
                    }
                }
                SearchState::Found(place, tier) => {
                    info!(
                        "Found '{}' at ({:.5}, {:.5}) via {:?}",
                        place_name,
                        place.latitude(),
                        place.longitude(),
                        tier
                    );
                    return Resolution::Found { place, tier };
                }
                SearchState::NotFound => {
                    info!("No match for '{}'", place_name);
                    return Resolution::NotFound {
                        place_name: place_name.to_string(),
                    };
                }
            };
        }
    }

    /// Any museum of the destination not already on the map
    async fn category_fallback(
        &self,
        place_name: &str,
        destination: &Destination,
        taken: &[ResolvedPlace],
    ) -> Option<ResolvedPlace> {
        let query = format!("museum {} {}", destination.city, destination.country);
        let candidates = self.query(&query, self.config.category_limit).await;

        let candidate = candidates
            .iter()
            .find(|c| !holds_feature(taken, c.primary_name()))?;

        let mut place = ResolvedPlace::point_of_interest(place_name, candidate);
        place.matched_name = Some(candidate.primary_name().to_string());
        Some(place)
    }

    /// Wider search filtered by the configured locality check
    async fn general_fallback(
        &self,
        place_name: &str,
        destination: &Destination,
    ) -> Option<ResolvedPlace> {
        let query = format!(
            "{} {} {}",
            place_name.trim(),
            destination.city,
            destination.country
        );
        let candidates = self.query(&query, self.config.fallback_limit).await;

        let candidate = candidates.iter().find(|c| match self.config.fallback_locality {
            FallbackLocality::Structured => passes_locality(c, destination),
            FallbackLocality::DisplayName => mentions_locality(c, destination),
        })?;

        Some(ResolvedPlace::point_of_interest(place_name, candidate))
    }

    /// Geocode the trip destination itself.
    ///
    /// City and country come from the best candidate's structured address when
    /// present, otherwise from the comma segments of `input`. The marker is
    /// `None` when the service knows nothing about the destination.
    #[instrument(skip(self))]
    pub async fn resolve_destination(&self, input: &str) -> (Destination, Option<ResolvedPlace>) {
        let destination = Destination::from_input(input);
        let candidates = self.query(destination.query.as_str(), 1).await;

        let Some(candidate) = candidates.into_iter().next() else {
            warn!("Destination '{}' not found", input);
            return (destination, None);
        };

        let destination = destination.refined_by(&candidate.address);
        let marker = ResolvedPlace {
            place_name: destination.query.clone(),
            position: (candidate.latitude, candidate.longitude),
            display_address: candidate.display_name,
            description: None,
            category: PlaceCategory::Destination,
            matched_name: None,
        };
        info!(
            "Destination '{}' resolved to {}, {}",
            input, destination.city, destination.country
        );
        (destination, Some(marker))
    }
}

/// Whether one of `markers` already shows the feature named `feature`
pub(super) fn holds_feature(markers: &[ResolvedPlace], feature: &str) -> bool {
    let feature = feature.to_lowercase();
    markers
        .iter()
        .any(|m| m.popup_text().to_lowercase().contains(&feature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::mock::{MockGeocoder, candidate};
    use std::time::Duration;

    fn paris() -> Destination {
        Destination::new("Paris, France", "Paris", "France")
    }

    fn resolver(mock: Arc<MockGeocoder>) -> Resolver {
        Resolver::new(mock, ResolverConfig::default())
    }

    #[tokio::test]
    async fn test_first_accepted_query_stops_search() {
        let mock = Arc::new(
            MockGeocoder::new()
                .with("Louvre, Paris, France", vec![])
                .with(
                    "Louvre, Paris",
                    vec![candidate("Musée du Louvre, Paris, France", Some("Paris"), Some("France"))],
                ),
        );
        let resolution = resolver(mock.clone()).resolve("Louvre", &paris(), &[]).await;

        let Resolution::Found { place, tier } = resolution else {
            panic!("expected Louvre to resolve");
        };
        assert_eq!(place.place_name, "Louvre");
        assert_eq!(place.display_address, "Musée du Louvre, Paris, France");
        assert_eq!(place.category, PlaceCategory::PointOfInterest);
        assert_eq!(
            tier,
            MatchTier::Query {
                index: 1,
                query: "Louvre, Paris".into()
            }
        );
        assert_eq!(mock.queries(), vec!["Louvre, Paris, France", "Louvre, Paris"]);
    }

    #[tokio::test]
    async fn test_transport_failure_moves_to_next_query() {
        let mock = Arc::new(
            MockGeocoder::new()
                .failing("Louvre, Paris, France")
                .with(
                    "Louvre, Paris",
                    vec![candidate("Louvre, Paris, France", Some("Paris"), Some("France"))],
                ),
        );
        let resolution = resolver(mock).resolve("Louvre", &paris(), &[]).await;
        assert!(matches!(resolution, Resolution::Found { .. }));
    }

    #[tokio::test]
    async fn test_general_fallback_with_structured_check() {
        let mock = Arc::new(MockGeocoder::new().with(
            "Hidden Bistro Paris France",
            vec![
                candidate("Hidden Bistro, Lyon, France", Some("Lyon"), Some("France")),
                candidate("Hidden Bistro, Paris, France", Some("Paris"), Some("France")),
            ],
        ));
        // "Hidden Bistro Paris France" is also the third primary query; make it
        // answer only at the larger fallback limit
        let mut config = ResolverConfig::default();
        config.query_limit = 0;
        let resolver = Resolver::new(mock.clone(), config);

        let resolution = resolver.resolve("Hidden Bistro", &paris(), &[]).await;
        let Resolution::Found { place, tier } = resolution else {
            panic!("expected general fallback to match");
        };
        assert_eq!(tier, MatchTier::GeneralFallback);
        assert_eq!(place.display_address, "Hidden Bistro, Paris, France");

        let (query, limit, _) = mock.calls().last().cloned().unwrap();
        assert_eq!(query, "Hidden Bistro Paris France");
        assert_eq!(limit, 10);
    }

    #[tokio::test]
    async fn test_general_fallback_display_name_check() {
        let mock = Arc::new(MockGeocoder::new().with(
            "Hidden Bistro Paris France",
            vec![candidate("Hidden Bistro, 5e Arrondissement, Paris, France", None, None)],
        ));
        let mut config = ResolverConfig::default();
        config.query_limit = 0;

        let structured = Resolver::new(mock.clone(), config.clone())
            .resolve("Hidden Bistro", &paris(), &[])
            .await;
        assert!(matches!(structured, Resolution::NotFound { .. }));

        config.fallback_locality = FallbackLocality::DisplayName;
        let coarse = Resolver::new(mock, config)
            .resolve("Hidden Bistro", &paris(), &[])
            .await;
        assert!(matches!(coarse, Resolution::Found { tier: MatchTier::GeneralFallback, .. }));
    }

    #[tokio::test]
    async fn test_category_fallback_skips_taken_museums() {
        let mock = Arc::new(MockGeocoder::new().with(
            "museum Paris France",
            vec![
                candidate("Musée du Louvre, Rue de Rivoli, Paris, France", None, None),
                candidate("Musée d'Orsay, Rue de Lille, Paris, France", None, None),
            ],
        ));
        let taken = vec![ResolvedPlace::point_of_interest(
            "Louvre",
            &candidate("Musée du Louvre, Rue de Rivoli, Paris, France", None, None),
        )];

        let resolution = resolver(mock.clone())
            .resolve("Imaginary Art Museum", &paris(), &taken)
            .await;
        let Resolution::Found { place, tier } = resolution else {
            panic!("expected category fallback to match");
        };
        assert_eq!(tier, MatchTier::CategoryFallback);
        assert_eq!(place.place_name, "Imaginary Art Museum");
        assert_eq!(place.matched_name.as_deref(), Some("Musée d'Orsay"));
        assert_eq!(place.title(), "Imaginary Art Museum (Musée d'Orsay)");

        let (query, limit, _) = mock
            .calls()
            .into_iter()
            .find(|(q, _, _)| q == "museum Paris France")
            .unwrap();
        assert_eq!(query, "museum Paris France");
        assert_eq!(limit, 5);
    }

    #[tokio::test]
    async fn test_category_retry_skips_primary_queries() {
        let mock = Arc::new(MockGeocoder::new().with(
            "museum Paris France",
            vec![candidate("Musée du Louvre, Rue de Rivoli, Paris, France", None, None)],
        ));
        let taken = vec![ResolvedPlace::point_of_interest(
            "Louvre",
            &candidate("Musée du Louvre, Rue de Rivoli, Paris, France", None, None),
        )];

        let resolution = resolver(mock.clone())
            .resolve_category_again("Ghost Art Museum", &paris(), &taken)
            .await;
        assert!(matches!(resolution, Resolution::NotFound { .. }));
        assert_eq!(
            mock.queries(),
            vec!["museum Paris France", "Ghost Art Museum Paris France"]
        );
    }

    #[test]
    fn test_holds_feature_ignores_case() {
        let markers = vec![ResolvedPlace::point_of_interest(
            "Louvre",
            &candidate("Musée du Louvre, Paris", None, None),
        )];
        assert!(holds_feature(&markers, "MUSÉE DU LOUVRE"));
        assert!(!holds_feature(&markers, "Musée d'Orsay"));
    }

    #[tokio::test]
    async fn test_not_found_after_every_tier() {
        let mock = Arc::new(MockGeocoder::new().failing_for("Atlantis"));
        let resolution = resolver(mock.clone()).resolve("Atlantis Museum", &paris(), &[]).await;

        assert_eq!(
            resolution,
            Resolution::NotFound {
                place_name: "Atlantis Museum".into()
            }
        );
        let queries = mock.queries();
        // 7 primary queries, the category fallback, then the general fallback
        assert_eq!(queries.len(), 9);
        assert_eq!(queries[7], "museum Paris France");
        assert_eq!(queries[8], "Atlantis Museum Paris France");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_query_times_out() {
        let mock = Arc::new(
            MockGeocoder::new()
                .hanging_for("Louvre, Paris, France")
                .with(
                    "Louvre, Paris",
                    vec![candidate("Louvre, Paris, France", Some("Paris"), Some("France"))],
                ),
        );
        let start = tokio::time::Instant::now();
        let resolution = resolver(mock).resolve("Louvre", &paris(), &[]).await;

        assert!(matches!(resolution, Resolution::Found { .. }));
        let elapsed = start.elapsed();
        assert!(elapsed >= ResolverConfig::default().query_timeout());
        assert!(elapsed < Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_resolve_destination_uses_structured_address() {
        let mut paris_candidate = candidate(
            "Paris, Île-de-France, France métropolitaine, France",
            Some("Paris"),
            Some("France"),
        );
        paris_candidate.latitude = 48.8589;
        let mock = Arc::new(MockGeocoder::new().with("paris", vec![paris_candidate]));

        let (destination, marker) = resolver(mock.clone()).resolve_destination("paris").await;
        assert_eq!(destination.city, "Paris");
        assert_eq!(destination.country, "France");

        let marker = marker.unwrap();
        assert_eq!(marker.category, PlaceCategory::Destination);
        assert_eq!(marker.place_name, "paris");
        assert_eq!(marker.latitude(), 48.8589);
        assert_eq!(mock.calls()[0].1, 1);
    }

    #[tokio::test]
    async fn test_unknown_destination_keeps_input() {
        let mock = Arc::new(MockGeocoder::new());
        let (destination, marker) = resolver(mock).resolve_destination("Lisbon, Portugal").await;
        assert!(marker.is_none());
        assert_eq!(destination.city, "Lisbon");
        assert_eq!(destination.country, "Portugal");
    }
}
