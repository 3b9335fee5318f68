//! Text processing for AI-generated travel prose
//!
//! - Extract: marked place mentions and their one-sentence descriptions
//! - Itinerary: day-structured sections for the first itinerary message
//! - Highlight: marks only resolved mentions as interactive references

use regex::Regex;
use std::sync::LazyLock;

pub mod extract;
pub mod highlight;
pub mod itinerary;

pub use extract::{PlaceDescriptions, extract_descriptions, extract_mentions, place_names};
pub use highlight::{FoundSet, highlight};
pub use itinerary::{ItineraryLayout, ItinerarySection, format_itinerary};

/// `**Name**` spans; never crosses a line break
pub(crate) static PLACE_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("place markup pattern is valid"));

/// Escape text for embedding in HTML content or a quoted attribute
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
