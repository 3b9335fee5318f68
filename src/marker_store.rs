//! Resolved markers of one trip
//!
//! Holds the single destination marker apart from the ordered, deduplicated
//! points of interest. Mutations are applied sequentially by the owning
//! session; the store itself does no locking.

use serde::Serialize;
use tracing::debug;

use crate::models::{MarkerView, ResolvedPlace};
use crate::text::FoundSet;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MarkerStore {
    destination: Option<ResolvedPlace>,
    points: Vec<ResolvedPlace>,
}

impl MarkerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the destination marker
    pub fn set_destination(&mut self, destination: ResolvedPlace) {
        self.destination = Some(destination);
    }

    /// Append newly resolved places, keeping only the first entry per name.
    ///
    /// Returns how many of `batch` were actually added.
    pub fn merge_points_of_interest(&mut self, batch: Vec<ResolvedPlace>) -> usize {
        let before = self.points.len();
        self.points.extend(batch);

        let mut seen = std::collections::HashSet::new();
        self.points.retain(|p| seen.insert(p.place_name.clone()));

        let added = self.points.len() - before;
        debug!("Merged {} new markers, {} total", added, self.points.len());
        added
    }

    pub fn clear(&mut self) {
        self.destination = None;
        self.points.clear();
    }

    #[must_use]
    pub fn destination(&self) -> Option<&ResolvedPlace> {
        self.destination.as_ref()
    }

    #[must_use]
    pub fn points_of_interest(&self) -> &[ResolvedPlace] {
        &self.points
    }

    /// Destination first, then points of interest in insertion order
    pub fn all(&self) -> impl Iterator<Item = &ResolvedPlace> {
        self.destination.iter().chain(self.points.iter())
    }

    /// Names of the points of interest, for highlighting
    #[must_use]
    pub fn found_set(&self) -> FoundSet {
        self.points.iter().map(|p| p.place_name.as_str()).collect()
    }

    /// Render-ready views of every marker
    #[must_use]
    pub fn views(&self, city: &str) -> Vec<MarkerView> {
        self.all().map(|p| MarkerView::from_place(p, city)).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destination.is_none() && self.points.is_empty()
    }
}
