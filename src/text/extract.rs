//! Entity extraction
//!
//! Pulls `**Name**` place mentions out of free text, together with a cleaned
//! one-sentence description for every distinct name.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use super::PLACE_MARKUP;
use super::itinerary::parse_day_header;
use crate::models::PlaceMention;

/// Place name -> cleaned description sentence
pub type PlaceDescriptions = HashMap<String, String>;

static LEADING_VERB: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"^(?:is|are|was|were|will be|will|would|can|could|should|may|might|must)\b\s*",
    )
    .case_insensitive(true)
    .build()
    .expect("leading verb pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Byte range of the sentence around `start..end`, terminator included
fn sentence_around(text: &str, start: usize, end: usize) -> &str {
    let from = text[..start]
        .rfind(is_sentence_end)
        .map_or(0, |i| i + 1);
    let to = text[end..]
        .find(is_sentence_end)
        .map_or(text.len(), |i| end + i + 1);
    text[from..to].trim()
}

/// Split text into trimmed, non-empty sentences (terminators kept)
fn sentences(text: &str) -> Vec<&str> {
    text.split_inclusive(is_sentence_end)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Every marked span in left-to-right order, duplicates included.
/// Bolded day headers are not places and are skipped.
#[must_use]
pub fn extract_mentions(text: &str) -> Vec<PlaceMention> {
    let mentions: Vec<PlaceMention> = PLACE_MARKUP
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().trim();
            // "**Day 1:** Arrival" marks a header, not a place
            if name.is_empty() || parse_day_header(name).is_some() {
                return None;
            }
            Some(PlaceMention {
                name: name.to_string(),
                source_sentence: sentence_around(text, whole.start(), whole.end()).to_string(),
            })
        })
        .collect();

    debug!("Extracted {} place mentions", mentions.len());
    mentions
}

/// Names of all mentions, in order, duplicates included
#[must_use]
pub fn place_names(mentions: &[PlaceMention]) -> Vec<String> {
    mentions.iter().map(|m| m.name.clone()).collect()
}

/// Description for each name from the first sentence that mentions it
#[must_use]
pub fn extract_descriptions(text: &str, names: &[String]) -> PlaceDescriptions {
    let sentences = sentences(text);
    let mut descriptions = PlaceDescriptions::new();

    for name in names {
        let needle = name.to_lowercase();
        let Some(sentence) = sentences
            .iter()
            .find(|s| s.to_lowercase().contains(&needle))
        else {
            continue;
        };

        if let Some(cleaned) = clean_description(sentence, name) {
            descriptions.insert(name.clone(), cleaned);
        }
    }

    descriptions
}

/// Remove the name's markup span, a leading copula/modal verb and colons,
/// then capitalize
fn clean_description(sentence: &str, name: &str) -> Option<String> {
    let own_markup = RegexBuilder::new(&format!(r"\*\*\s*{}\s*\*\*", regex::escape(name)))
        .case_insensitive(true)
        .build()
        .ok()?;

    let without_name = own_markup.replace_all(sentence, " ");
    let without_marks = PLACE_MARKUP.replace_all(&without_name, "$1");
    let without_colons = without_marks.replace(':', " ").replace("**", "");
    let collapsed = WHITESPACE.replace_all(&without_colons, " ");

    let trimmed = trim_leading_punctuation(&collapsed);
    let without_verb = LEADING_VERB.replace(trimmed, "");
    let cleaned = trim_leading_punctuation(&without_verb).trim_end();

    if cleaned.chars().all(|c| !c.is_alphanumeric()) {
        return None;
    }
    Some(capitalize_first(cleaned))
}

fn trim_leading_punctuation(text: &str) -> &str {
    text.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '–' | '—' | ',' | ';' | '*' | '•')
    })
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_extract_in_order_with_duplicates() {
        let text = "Start at **Louvre**, then **  Eiffel Tower **. Back to **Louvre** at night.";
        let names = place_names(&extract_mentions(text));
        assert_eq!(names, vec!["Louvre", "Eiffel Tower", "Louvre"]);
    }

    #[test]
    fn test_extract_without_markup_is_empty() {
        assert!(extract_mentions("Paris is lovely in spring.").is_empty());
        assert!(extract_mentions("").is_empty());
    }

    #[test]
    fn test_empty_spans_are_skipped() {
        let names = place_names(&extract_mentions("**** then **Orsay**\n**  **"));
        assert_eq!(names, vec!["Orsay"]);
    }

    #[test]
    fn test_bold_day_headers_are_not_places() {
        let text = "**Day 1:** Arrival\n- **Louvre**\n**Day 2**\n- **Day Spa Paris**";
        let names = place_names(&extract_mentions(text));
        assert_eq!(names, vec!["Louvre", "Day Spa Paris"]);
    }

    #[test]
    fn test_source_sentence() {
        let text = "Welcome to Paris. **Louvre** is huge! Enjoy.";
        let mentions = extract_mentions(text);
        assert_eq!(mentions[0].source_sentence, "**Louvre** is huge!");
    }

    #[rstest]
    #[case(
        "**Louvre** is the world's largest art museum.",
        "Louvre",
        "The world's largest art museum."
    )]
    #[case(
        "1. **Sainte-Chapelle**: a gem of Gothic architecture.",
        "Sainte-Chapelle",
        "A gem of Gothic architecture."
    )]
    #[case(
        "**Le Marais** - can be explored on foot!",
        "Le Marais",
        "Be explored on foot!"
    )]
    #[case(
        "Have dinner at **Le Cafe** near **Louvre**.",
        "Le Cafe",
        "Have dinner at near Louvre."
    )]
    fn test_description_cleaning(#[case] text: &str, #[case] name: &str, #[case] expected: &str) {
        let descriptions = extract_descriptions(text, &[name.to_string()]);
        assert_eq!(descriptions.get(name).map(String::as_str), Some(expected));
    }

    #[test]
    fn test_description_uses_first_mentioning_sentence() {
        let text = "The **Louvre** houses the Mona Lisa. Later, revisit the louvre for sculptures.";
        let descriptions = extract_descriptions(text, &["Louvre".to_string(), "Louvre".to_string()]);
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions["Louvre"], "The houses the Mona Lisa.");
    }

    #[test]
    fn test_description_skips_bare_mentions() {
        let text = "**Louvre**\n**Orsay** is an old railway station.";
        let names = vec!["Louvre".to_string(), "Orsay".to_string()];
        let descriptions = extract_descriptions(text, &names);
        assert!(!descriptions.contains_key("Louvre"));
        assert_eq!(descriptions["Orsay"], "An old railway station.");
    }
}
