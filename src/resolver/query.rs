//! Search strategy: the ordered geocoder queries tried for one place

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static MUSEUM: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new("museum")
        .case_insensitive(true)
        .build()
        .expect("museum pattern is valid")
});

/// Whether the place belongs to the category with dedicated query variants
/// and a category fallback tier
#[must_use]
pub fn is_museum(place_name: &str) -> bool {
    place_name.to_lowercase().contains("museum")
}

/// Queries for `place_name`, most specific first.
///
/// Museums get extra variants: the name without "museum" and the name cut at
/// the first `:` or `(`, each with and without "museum" re-appended.
#[must_use]
pub fn build_queries(place_name: &str, city: &str, country: &str) -> Vec<String> {
    let name = place_name.trim();
    let mut queries = vec![
        format!("{name}, {city}, {country}"),
        format!("{name}, {city}"),
        format!("{name} {city} {country}"),
        format!("{name} {city}"),
        name.to_string(),
    ];

    if is_museum(name) {
        let without_museum = MUSEUM.replace_all(name, "");
        let without_museum = without_museum.trim();
        if !without_museum.is_empty() {
            queries.push(format!("{without_museum}, {city}, {country}"));
            queries.push(format!("{without_museum} museum, {city}, {country}"));
        }

        let main_name = name
            .split([':', '('])
            .next()
            .unwrap_or_default()
            .trim();
        if !main_name.is_empty() && main_name != name {
            queries.push(format!("{main_name}, {city}, {country}"));
            queries.push(format!("{main_name} museum, {city}, {country}"));
        }
    }

    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.clone()));
    queries
}
