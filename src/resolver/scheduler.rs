//! Batched resolution of many places
//!
//! Places are resolved in fixed-width batches: everything inside a batch runs
//! concurrently, batches run strictly one after another with a pause between
//! them so the geocoding service's rate limit is respected.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, instrument};

use super::resolve::{MatchTier, Resolution, Resolver, holds_feature};
use crate::models::{Destination, ResolvedPlace};
use crate::text::PlaceDescriptions;

pub struct BatchScheduler {
    resolver: Resolver,
    concurrency: usize,
    pacing: Duration,
}

impl BatchScheduler {
    /// Scheduler using the resolver's configured batch width and pacing
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        let concurrency = resolver.config().concurrency.max(1);
        let pacing = resolver.config().pacing();
        Self {
            resolver,
            concurrency,
            pacing,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Split `names` into the batches that will be launched, dropping repeats
    #[must_use]
    pub fn plan(&self, names: &[String]) -> Vec<Vec<String>> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();

        unique
            .chunks(self.concurrency)
            .map(<[String]>::to_vec)
            .collect()
    }

    /// Resolve `names` and return the places that were found, in order of
    /// first occurrence.
    ///
    /// `known` are markers already on the map; together with the places found
    /// earlier in the call they are excluded from category fallback matches.
    #[instrument(skip_all, fields(city = %destination.city, places = names.len()))]
    pub async fn resolve_all(
        &self,
        names: &[String],
        descriptions: &PlaceDescriptions,
        destination: &Destination,
        known: &[ResolvedPlace],
    ) -> Vec<ResolvedPlace> {
        let batches = self.plan(names);
        let mut taken: Vec<ResolvedPlace> = known.to_vec();
        let mut found = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            debug!("Launching batch {}/{}: {:?}", index + 1, batches.len(), batch);

            let resolutions = futures::future::join_all(
                batch
                    .iter()
                    .map(|name| self.resolver.resolve(name, destination, &taken))
                    .collect::<Vec<_>>(),
            )
            .await;

            // siblings ran against the same snapshot; a category match may
            // already be claimed by one accepted before it
            for (name, resolution) in batch.iter().zip(resolutions) {
                let resolution = match resolution {
                    Resolution::Found {
                        place,
                        tier: MatchTier::CategoryFallback,
                    } if place
                        .matched_name
                        .as_deref()
                        .is_some_and(|feature| holds_feature(&taken, feature)) =>
                    {
                        debug!(
                            "'{}' matched {:?}, which is already on the map",
                            name, place.matched_name
                        );
                        self.resolver
                            .resolve_category_again(name, destination, &taken)
                            .await
                    }
                    other => other,
                };
                if let Resolution::Found { mut place, .. } = resolution {
                    place.description = descriptions.get(&place.place_name).cloned();
                    taken.push(place.clone());
                    found.push(place);
                }
            }
        }

        info!(
            "Resolved {}/{} places in {} batches",
            found.len(),
            batches.iter().map(Vec::len).sum::<usize>(),
            batches.len()
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::geocoding::mock::{MockGeocoder, candidate};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn paris() -> Destination {
        Destination::new("Paris, France", "Paris", "France")
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn scripted(places: &[&str]) -> MockGeocoder {
        places.iter().fold(MockGeocoder::new(), |mock, place| {
            mock.with(
                &format!("{place}, Paris, France"),
                vec![candidate(&format!("{place}, Paris, France"), Some("Paris"), Some("France"))],
            )
        })
    }

    fn scheduler(mock: Arc<MockGeocoder>, config: ResolverConfig) -> BatchScheduler {
        BatchScheduler::new(Resolver::new(mock, config))
    }

    #[test]
    fn test_plan_dedups_and_chunks() {
        let scheduler = scheduler(Arc::new(MockGeocoder::new()), ResolverConfig::default());
        let plan = scheduler.plan(&names(&["A", "B", "A", "C", "D", "E", "F", "G"]));
        let sizes: Vec<usize> = plan.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(plan[0], names(&["A", "B", "C"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seven_places_three_paced_batches() {
        let places = ["P1", "P2", "P3", "P4", "P5", "P6", "P7"];
        let mock = Arc::new(scripted(&places));
        let start = Instant::now();

        let found = scheduler(mock.clone(), ResolverConfig::default())
            .resolve_all(&names(&places), &PlaceDescriptions::new(), &paris(), &[])
            .await;

        assert_eq!(found.len(), 7);
        let order: Vec<&str> = found.iter().map(|p| p.place_name.as_str()).collect();
        assert_eq!(order, places);

        // every place answers on its first query, so one call per place
        let offsets: Vec<u128> = mock
            .calls()
            .iter()
            .map(|(_, _, at)| at.duration_since(start).as_millis())
            .collect();
        assert_eq!(offsets, vec![0, 0, 0, 300, 300, 300, 600]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_delay_siblings() {
        let mock = Arc::new(scripted(&["Louvre", "Orsay"]).failing_for("Broken"));
        let start = Instant::now();

        let found = scheduler(mock.clone(), ResolverConfig::default())
            .resolve_all(
                &names(&["Louvre", "Broken Place", "Orsay", "Pantheon"]),
                &PlaceDescriptions::new(),
                &paris(),
                &[],
            )
            .await;

        let order: Vec<&str> = found.iter().map(|p| p.place_name.as_str()).collect();
        assert_eq!(order, vec!["Louvre", "Orsay"]);

        // second batch ("Pantheon") starts right after the pause
        let pantheon_first = mock
            .calls()
            .into_iter()
            .find(|(q, _, _)| q.starts_with("Pantheon"))
            .map(|(_, _, at)| at.duration_since(start))
            .unwrap();
        assert_eq!(pantheon_first, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_query_only_stalls_its_own_place() {
        let mut config = ResolverConfig::default();
        config.query_timeout_seconds = 2;
        let mock = Arc::new(scripted(&["Louvre", "Orsay"]).hanging_for("Stuck"));
        let start = Instant::now();

        let found = scheduler(mock.clone(), config)
            .resolve_all(
                &names(&["Stuck Cafe", "Louvre", "Orsay"]),
                &PlaceDescriptions::new(),
                &paris(),
                &[],
            )
            .await;

        assert_eq!(found.len(), 2);
        let louvre = mock
            .calls()
            .into_iter()
            .find(|(q, _, _)| q.starts_with("Louvre"))
            .map(|(_, _, at)| at.duration_since(start))
            .unwrap();
        assert_eq!(louvre, Duration::ZERO);
        // 5 primary queries and the general fallback, each cut at 2s
        assert!(start.elapsed() >= Duration::from_secs(12));
    }

    fn museums() -> MockGeocoder {
        MockGeocoder::new().with(
            "museum Paris France",
            vec![
                candidate("Musée du Louvre, Rue de Rivoli, Paris, France", None, None),
                candidate("Musée d'Orsay, Rue de Lille, Paris, France", None, None),
            ],
        )
    }

    fn matched(found: &[ResolvedPlace]) -> Vec<Option<&str>> {
        found.iter().map(|p| p.matched_name.as_deref()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_batch_museums_get_distinct_features() {
        let mock = Arc::new(museums());

        let found = scheduler(mock.clone(), ResolverConfig::default())
            .resolve_all(
                &names(&["Ghost Art Museum", "Phantom History Museum"]),
                &PlaceDescriptions::new(),
                &paris(),
                &[],
            )
            .await;

        assert_eq!(matched(&found), vec![Some("Musée du Louvre"), Some("Musée d'Orsay")]);
        let category_queries = mock
            .queries()
            .into_iter()
            .filter(|q| q == "museum Paris France")
            .count();
        assert_eq!(category_queries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_batches_skip_taken_museums() {
        let mock = Arc::new(museums());

        let found = scheduler(mock.clone(), ResolverConfig::default())
            .resolve_all(
                &names(&["Ghost Art Museum", "Nowhere", "Elsewhere", "Phantom History Museum"]),
                &PlaceDescriptions::new(),
                &paris(),
                &[],
            )
            .await;

        assert_eq!(matched(&found), vec![Some("Musée du Louvre"), Some("Musée d'Orsay")]);
        let category_queries = mock
            .queries()
            .into_iter()
            .filter(|q| q == "museum Paris France")
            .count();
        assert_eq!(category_queries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_known_markers_exclude_every_museum() {
        let mock = Arc::new(museums());
        let known = vec![
            ResolvedPlace::point_of_interest(
                "Louvre",
                &candidate("Musée du Louvre, Rue de Rivoli, Paris, France", None, None),
            ),
            ResolvedPlace::point_of_interest(
                "Orsay",
                &candidate("Musée d'Orsay, Rue de Lille, Paris, France", None, None),
            ),
        ];

        let found = scheduler(mock, ResolverConfig::default())
            .resolve_all(
                &names(&["Ghost Art Museum"]),
                &PlaceDescriptions::new(),
                &paris(),
                &known,
            )
            .await;

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_descriptions_are_attached() {
        let mock = Arc::new(scripted(&["Louvre"]));
        let mut descriptions = PlaceDescriptions::new();
        descriptions.insert("Louvre".into(), "Home of the Mona Lisa".into());

        let found = scheduler(mock, ResolverConfig::default())
            .resolve_all(&names(&["Louvre", "Nowhere"]), &descriptions, &paris(), &[])
            .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description.as_deref(), Some("Home of the Mona Lisa"));
    }
}
