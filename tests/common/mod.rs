//! Scripted geocoder and chat backend shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use lawander::models::AddressDetails;
use lawander::{ChatBackend, GeocodeCandidate, Geocoder};

pub fn candidate(display_name: &str, city: &str, country: &str) -> GeocodeCandidate {
    GeocodeCandidate {
        latitude: 48.85,
        longitude: 2.35,
        display_name: display_name.to_string(),
        address: AddressDetails {
            city: Some(city.to_string()),
            country: Some(country.to_string()),
            ..Default::default()
        },
    }
}

/// Paris with a handful of well-known places; everything else is unknown
#[derive(Default)]
pub struct ParisGeocoder {
    replies: HashMap<String, Vec<GeocodeCandidate>>,
    queries: Mutex<Vec<String>>,
}

impl ParisGeocoder {
    pub fn new() -> Self {
        let mut replies = HashMap::new();
        replies.insert(
            "Paris, France".to_string(),
            vec![candidate("Paris, Île-de-France, France", "Paris", "France")],
        );
        for place in ["Louvre", "Eiffel Tower", "Le Cafe", "Musée d'Orsay"] {
            replies.insert(
                format!("{place}, Paris, France"),
                vec![candidate(&format!("{place}, Paris, France"), "Paris", "France")],
            );
        }
        Self {
            replies,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for ParisGeocoder {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<GeocodeCandidate>> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.contains("Unreachable") {
            return Err(anyhow!("connection reset"));
        }
        let mut candidates = self.replies.get(query).cloned().unwrap_or_default();
        candidates.truncate(limit);
        Ok(candidates)
    }
}

/// Replies from a queue; `None` entries fail like an unreachable backend
pub struct ScriptedChat {
    replies: Mutex<Vec<Option<String>>>,
}

impl ScriptedChat {
    pub fn new(replies: &[Option<&str>]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
        }
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(anyhow!("no scripted reply"));
        }
        replies.remove(0).ok_or_else(|| anyhow!("backend unavailable"))
    }
}

pub const ITINERARY: &str = "Here is your trip!

Day 1: Arrival
- Visit **Louvre**. It is the largest art museum in the world.
- Dinner at **Le Cafe**
Day 2
- Walk to the **Eiffel Tower**
- Lunch at **Unreachable Bistro**
";
