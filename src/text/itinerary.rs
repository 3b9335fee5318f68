//! Itinerary formatting
//!
//! Restructures the raw day-by-day reply of the chat backend into ordered day
//! sections. Sections keep the order in which days appear in the text.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::{FoundSet, highlight};

static DAY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^day\s+(\d+)\s*(?:[:\-–—.]\s*(.*))?$")
        .case_insensitive(true)
        .build()
        .expect("day header pattern is valid")
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-•–]\s+|\*\s+|\d+[.)]\s+)").expect("bullet pattern is valid")
});

/// One day of the itinerary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItinerarySection {
    /// e.g. "Day 1: Arrival"
    pub label: String,
    /// Item lines with bullets removed, place markup preserved
    pub items: Vec<String>,
}

/// Result of formatting: day sections, or a flat list when no day header exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "content", rename_all = "snake_case")]
pub enum ItineraryLayout {
    Days(Vec<ItinerarySection>),
    Flat(Vec<String>),
}

/// Parse a day header line into its label
pub(super) fn parse_day_header(line: &str) -> Option<String> {
    let stripped =
        line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '#' | '*' | '-' | '•'));
    let mut stripped = stripped
        .trim_end_matches(|c: char| c.is_whitespace() || c == '#')
        .to_string();
    // "*Day 2*" keeps the closing half of an emphasis opened by the trim above
    while stripped.ends_with('*') && stripped.matches('*').count() % 2 == 1 {
        stripped.pop();
    }
    // "**Day 1:** Old town" leaves a dangling delimiter behind
    if stripped.matches("**").count() % 2 == 1 {
        stripped = stripped.replacen("**", "", 1);
    }
    let stripped = stripped.trim_end_matches(|c: char| c.is_whitespace() || c == '#');

    let caps = DAY_HEADER.captures(stripped)?;
    let number = caps.get(1)?.as_str();
    let label = match caps.get(2).map(|m| m.as_str().trim()) {
        Some(rest) if !rest.is_empty() => format!("Day {number}: {rest}"),
        _ => format!("Day {number}"),
    };
    Some(label)
}

fn strip_bullet(line: &str) -> &str {
    match BULLET.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line,
    }
}

/// Split raw itinerary text into day sections.
///
/// Lines before the first header are preface and dropped. Without any header
/// every non-empty line is kept as one flat block.
#[must_use]
pub fn format_itinerary(text: &str) -> ItineraryLayout {
    let mut sections: Vec<ItinerarySection> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(label) = parse_day_header(line) {
            sections.push(ItinerarySection {
                label,
                items: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            let item = strip_bullet(line);
            if !item.is_empty() {
                current.items.push(item.to_string());
            }
        }
    }

    if sections.is_empty() {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        return ItineraryLayout::Flat(lines);
    }

    ItineraryLayout::Days(sections)
}

impl ItineraryLayout {
    /// Day sections, empty for the flat layout
    #[must_use]
    pub fn sections(&self) -> &[ItinerarySection] {
        match self {
            ItineraryLayout::Days(sections) => sections,
            ItineraryLayout::Flat(_) => &[],
        }
    }

    /// Render as HTML blocks with found places highlighted
    #[must_use]
    pub fn render_html(&self, found: &FoundSet) -> String {
        let join = |lines: &[String]| {
            lines
                .iter()
                .map(|line| highlight(line, found))
                .collect::<Vec<_>>()
                .join("<br>")
        };

        match self {
            ItineraryLayout::Days(sections) => {
                let days: String = sections
                    .iter()
                    .map(|section| {
                        format!(
                            r#"<div class="itinerary-day"><h4 class="day-label">{}</h4><p>{}</p></div>"#,
                            highlight(&section.label, found),
                            join(&section.items)
                        )
                    })
                    .collect();
                format!(r#"<div class="itinerary">{days}</div>"#)
            }
            ItineraryLayout::Flat(lines) => {
                format!(r#"<div class="itinerary"><p>{}</p></div>"#, join(lines))
            }
        }
    }

    /// Plain text rendering, one labeled block per day
    #[must_use]
    pub fn render_text(&self) -> String {
        match self {
            ItineraryLayout::Days(sections) => sections
                .iter()
                .map(|s| format!("{}\n{}", s.label, s.items.join("\n")))
                .collect::<Vec<_>>()
                .join("\n\n"),
            ItineraryLayout::Flat(lines) => lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_two_day_itinerary() {
        let text = "Day 1: Arrival\n- Visit **Louvre**\n- Dinner at **Le Cafe**\nDay 2\n- Walk **Eiffel Tower**\n";
        let layout = format_itinerary(text);
        assert_eq!(
            layout,
            ItineraryLayout::Days(vec![
                ItinerarySection {
                    label: "Day 1: Arrival".into(),
                    items: vec!["Visit **Louvre**".into(), "Dinner at **Le Cafe**".into()],
                },
                ItinerarySection {
                    label: "Day 2".into(),
                    items: vec!["Walk **Eiffel Tower**".into()],
                },
            ])
        );
    }

    #[test]
    fn test_preface_is_discarded_and_order_kept() {
        let text = "Here is your plan!\n\n### Day 2 - Museums\n* **Orsay**\n**Day 1:** Old town\n1. **Notre-Dame**";
        let sections = format_itinerary(text);
        let labels: Vec<&str> = sections.sections().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Day 2: Museums", "Day 1: Old town"]);
        assert_eq!(sections.sections()[0].items, vec!["**Orsay**"]);
        assert_eq!(sections.sections()[1].items, vec!["**Notre-Dame**"]);
    }

    #[test]
    fn test_italic_headers_open_sections() {
        let text = "Day 1: Arrival\n- **Louvre**\n*Day 2*\n- **Orsay**\n*Day 3: Versailles*\n- **Chateau**";
        let layout = format_itinerary(text);
        let labels: Vec<&str> = layout.sections().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Day 1: Arrival", "Day 2", "Day 3: Versailles"]);
        assert_eq!(layout.sections()[0].items, vec!["**Louvre**"]);
        assert_eq!(layout.sections()[1].items, vec!["**Orsay**"]);
        assert_eq!(layout.sections()[2].items, vec!["**Chateau**"]);
    }

    #[rstest]
    #[case("Day 3", Some("Day 3"))]
    #[case("**Day 4: Versailles**", Some("Day 4: Versailles"))]
    #[case("## day 5: Montmartre ##", Some("Day 5: Montmartre"))]
    #[case("Day 6: **Giverny**", Some("Day 6: **Giverny**"))]
    #[case("*Day 2*", Some("Day 2"))]
    #[case("*Day 3: Versailles*", Some("Day 3: Versailles"))]
    #[case("***Day 7***", Some("Day 7"))]
    #[case("Day trip to Giverny", None)]
    #[case("Daylight walk", None)]
    fn test_day_header_detection(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_day_header(line).as_deref(), expected);
    }

    #[test]
    fn test_flat_fallback_without_headers() {
        let text = "Top sights:\n\n- **Louvre**\n- **Orsay**\n";
        let layout = format_itinerary(text);
        assert_eq!(
            layout,
            ItineraryLayout::Flat(vec![
                "Top sights:".into(),
                "- **Louvre**".into(),
                "- **Orsay**".into()
            ])
        );
        let found: FoundSet = ["Orsay"].into_iter().collect();
        assert_eq!(
            layout.render_html(&found),
            r#"<div class="itinerary"><p>Top sights:<br>- Louvre<br>- <span class="place-name" data-place="Orsay">Orsay</span></p></div>"#
        );
    }

    #[test]
    fn test_render_days_html() {
        let layout = format_itinerary("Day 1\n- **Louvre**\n- Lunch");
        let found: FoundSet = ["Louvre"].into_iter().collect();
        let html = layout.render_html(&found);
        assert_eq!(
            html,
            r#"<div class="itinerary"><div class="itinerary-day"><h4 class="day-label">Day 1</h4><p><span class="place-name" data-place="Louvre">Louvre</span><br>Lunch</p></div></div>"#
        );
        assert_eq!(layout.render_text(), "Day 1\n**Louvre**\nLunch");
    }
}
