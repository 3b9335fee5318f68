//! Marker presentation: place kinds, icons and the view handed to renderers

use serde::{Deserialize, Serialize};

use super::place::{PlaceCategory, ResolvedPlace};
use crate::text::escape_html;

/// Visual kind of a marker, derived from keywords in the place name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    Destination,
    Museum,
    Restaurant,
    Hotel,
    Nature,
    Religious,
    Shopping,
    Entertainment,
    Attraction,
}

const KIND_KEYWORDS: &[(PlaceKind, &[&str])] = &[
    (PlaceKind::Museum, &["museum", "gallery", "exhibition"]),
    (
        PlaceKind::Restaurant,
        &["restaurant", "cafe", "bar", "food", "dining", "kitchen"],
    ),
    (
        PlaceKind::Hotel,
        &["hotel", "accommodation", "hostel", "resort", "lodge"],
    ),
    (PlaceKind::Nature, &["park", "garden", "nature", "forest", "beach"]),
    (
        PlaceKind::Religious,
        &["church", "cathedral", "temple", "mosque", "synagogue"],
    ),
    (PlaceKind::Shopping, &["shop", "market", "mall", "store", "boutique"]),
    (
        PlaceKind::Entertainment,
        &["theater", "cinema", "concert", "show", "entertainment"],
    ),
];

impl PlaceKind {
    /// Classify a marker; the first matching keyword group wins
    #[must_use]
    pub fn classify(category: PlaceCategory, place_name: &str) -> Self {
        if category == PlaceCategory::Destination {
            return PlaceKind::Destination;
        }
        let name = place_name.to_lowercase();
        KIND_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
            .map_or(PlaceKind::Attraction, |(kind, _)| *kind)
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            PlaceKind::Destination => "🏙️",
            PlaceKind::Museum => "🏛️",
            PlaceKind::Restaurant => "🍽️",
            PlaceKind::Hotel => "🏨",
            PlaceKind::Nature => "🌳",
            PlaceKind::Religious => "⛪",
            PlaceKind::Shopping => "🛍️",
            PlaceKind::Entertainment => "🎭",
            PlaceKind::Attraction => "🎯",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            PlaceKind::Destination => "#ff69b4",
            PlaceKind::Museum => "#8B4513",
            PlaceKind::Restaurant => "#DC143C",
            PlaceKind::Hotel => "#4169E1",
            PlaceKind::Nature => "#228B22",
            PlaceKind::Religious => "#9370DB",
            PlaceKind::Shopping => "#FF8C00",
            PlaceKind::Entertainment => "#FF1493",
            PlaceKind::Attraction => "#1E90FF",
        }
    }

    /// Description used when the source text did not provide one
    #[must_use]
    pub fn default_description(self, city: &str) -> String {
        match self {
            PlaceKind::Destination => format!("Your trip destination: {city}."),
            PlaceKind::Museum => format!("A museum worth exploring in {city}."),
            PlaceKind::Restaurant => format!("A place to eat and drink in {city}."),
            PlaceKind::Hotel => format!("A place to stay in {city}."),
            PlaceKind::Nature => format!("A green space to relax in {city}."),
            PlaceKind::Religious => format!("A historic place of worship in {city}."),
            PlaceKind::Shopping => format!("A shopping spot in {city}."),
            PlaceKind::Entertainment => format!("An entertainment venue in {city}."),
            PlaceKind::Attraction => format!("A popular attraction in {city}."),
        }
    }
}

/// Everything a map renderer needs to draw one marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerView {
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: PlaceCategory,
    pub kind: PlaceKind,
    pub icon: String,
    pub color: String,
    /// Plain label: icon, title and description
    pub label: String,
    /// Escaped HTML popup content
    pub popup_html: String,
}

impl MarkerView {
    /// Build the view for a resolved place.
    ///
    /// `city` feeds the generated description of places without one.
    #[must_use]
    pub fn from_place(place: &ResolvedPlace, city: &str) -> Self {
        let kind = PlaceKind::classify(place.category, &place.place_name);
        let description = place
            .description
            .clone()
            .unwrap_or_else(|| kind.default_description(city));
        let title = place.title();

        let separator = match place.category {
            PlaceCategory::Destination => " - ",
            PlaceCategory::PointOfInterest => ": ",
        };
        let label = format!("{} {title}{separator}{description}", kind.icon());
        let popup_html = format!(
            "{} <strong>{}</strong><br>{}<br><small>{}</small>",
            kind.icon(),
            escape_html(&title),
            escape_html(&description),
            escape_html(&place.display_address),
        );

        Self {
            place_name: place.place_name.clone(),
            latitude: place.latitude(),
            longitude: place.longitude(),
            category: place.category,
            kind,
            icon: kind.icon().to_string(),
            color: kind.color().to_string(),
            label,
            popup_html,
        }
    }
}
