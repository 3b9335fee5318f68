//! Candidate scoring: locality filtering and best-candidate selection

use crate::models::{Destination, GeocodeCandidate};

/// Structured address locality and country both match the destination
#[must_use]
pub fn passes_locality(candidate: &GeocodeCandidate, destination: &Destination) -> bool {
    let city_matches = candidate
        .address
        .locality()
        .is_some_and(|locality| same_place_name(locality, &destination.city));
    let country_matches = candidate
        .address
        .country
        .as_deref()
        .is_some_and(|country| same_place_name(country, &destination.country));
    city_matches && country_matches
}

/// Display name mentions both destination city and country
#[must_use]
pub fn mentions_locality(candidate: &GeocodeCandidate, destination: &Destination) -> bool {
    let display = candidate.display_name.to_lowercase();
    display.contains(&destination.city.to_lowercase())
        && display.contains(&destination.country.to_lowercase())
}

/// Locality-passing candidates, or all of them when none pass
#[must_use]
pub fn result_set<'a>(
    candidates: &'a [GeocodeCandidate],
    destination: &Destination,
) -> Vec<&'a GeocodeCandidate> {
    let local: Vec<&GeocodeCandidate> = candidates
        .iter()
        .filter(|c| passes_locality(c, destination))
        .collect();

    if local.is_empty() {
        candidates.iter().collect()
    } else {
        local
    }
}

/// Pick one candidate for `place_name`.
///
/// Within the result set, the first display name containing the place name or
/// the city wins; otherwise the service's own first candidate.
#[must_use]
pub fn best_candidate<'a>(
    candidates: &'a [GeocodeCandidate],
    place_name: &str,
    destination: &Destination,
) -> Option<&'a GeocodeCandidate> {
    let results = result_set(candidates, destination);
    let name = place_name.to_lowercase();
    let city = destination.city.to_lowercase();

    results
        .iter()
        .find(|c| {
            let display = c.display_name.to_lowercase();
            display.contains(&name) || display.contains(&city)
        })
        .or_else(|| results.first())
        .copied()
}

/// Case-insensitive equality that also folds non-ASCII letters ("Zürich")
fn same_place_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
