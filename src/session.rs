//! Trip session: one destination, its markers and its conversation
//!
//! Every reply from the chat backend goes through the same pipeline: extract
//! marked places, resolve them in paced batches, merge the found ones into
//! the marker store and highlight only those in the rendered message. The
//! first reply is additionally laid out as a day-by-day itinerary.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::LawanderError;
use crate::chat::{ChatBackend, follow_up_prompt, itinerary_prompt};
use crate::marker_store::MarkerStore;
use crate::models::{Destination, MarkerView, ResolvedPlace};
use crate::resolver::BatchScheduler;
use crate::text::{
    ItineraryLayout, escape_html, extract_descriptions, extract_mentions, format_itinerary,
    highlight, place_names,
};

pub const MAX_TRIP_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One entry of the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    /// Raw text, place markup included
    pub text: String,
    /// Render-ready HTML
    pub html: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: Sender, text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            html: html.into(),
            timestamp: Utc::now(),
        }
    }

    fn user(text: &str) -> Self {
        Self::new(Sender::User, text, escape_html(text))
    }

    fn assistant_plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let html = escape_html(&text);
        Self::new(Sender::Assistant, text, html)
    }
}

/// How an assistant reply is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyLayout {
    /// Day sections (falls back to a flat list without day headers)
    Itinerary,
    /// Running text
    Prose,
}

/// Serializable view of a session for API and CLI output
#[derive(Debug, Clone, Serialize)]
pub struct TripSnapshot {
    pub destination: Destination,
    pub days: u32,
    pub markers: Vec<MarkerView>,
    pub itinerary: Option<ItineraryLayout>,
    pub messages: Vec<ChatMessage>,
}

pub struct TripSession {
    destination: Destination,
    days: u32,
    store: MarkerStore,
    itinerary: Option<ItineraryLayout>,
    transcript: Vec<ChatMessage>,
    scheduler: BatchScheduler,
    chat: Arc<dyn ChatBackend>,
}

impl TripSession {
    /// Open a session without asking for an itinerary yet.
    ///
    /// Geocodes the destination and posts the welcome message. An unknown
    /// destination is not an error: the session continues without a
    /// destination marker, using the typed city and country.
    #[instrument(skip(scheduler, chat))]
    pub async fn open(
        destination: &str,
        days: u32,
        scheduler: BatchScheduler,
        chat: Arc<dyn ChatBackend>,
    ) -> Result<Self> {
        let input = destination.trim();
        if input.is_empty() {
            return Err(LawanderError::validation("Destination cannot be empty").into());
        }
        if !(1..=MAX_TRIP_DAYS).contains(&days) {
            return Err(LawanderError::validation(format!(
                "Trip length must be between 1 and {MAX_TRIP_DAYS} days, got {days}"
            ))
            .into());
        }

        let (resolved, marker) = scheduler.resolver().resolve_destination(input).await;
        let mut store = MarkerStore::new();
        if let Some(mut marker) = marker {
            marker.description = Some(format!("Your destination for {days} days"));
            store.set_destination(marker);
        }

        let welcome = format!(
            "Welcome! I'll help you plan your {days}-day trip to {input}. \
             What would you like to know about your destination?"
        );

        Ok(Self {
            destination: resolved,
            days,
            store,
            itinerary: None,
            transcript: vec![ChatMessage::assistant_plain(welcome)],
            scheduler,
            chat,
        })
    }

    /// Open a session and request its itinerary
    pub async fn start(
        destination: &str,
        days: u32,
        scheduler: BatchScheduler,
        chat: Arc<dyn ChatBackend>,
    ) -> Result<Self> {
        let mut session = Self::open(destination, days, scheduler, chat).await?;
        session.generate_itinerary().await;
        Ok(session)
    }

    /// Ask the chat backend for a day-by-day itinerary and annotate it.
    ///
    /// A backend failure posts a single fallback message.
    #[instrument(skip(self), fields(destination = %self.destination.query))]
    pub async fn generate_itinerary(&mut self) -> &ChatMessage {
        let prompt = itinerary_prompt(&self.destination.query, self.days);
        match self.chat.complete(&prompt).await {
            Ok(reply) => self.annotate(&reply, ReplyLayout::Itinerary).await,
            Err(e) => {
                warn!("Itinerary request failed: {:#}", e);
                let text = format!(
                    "Sorry, I could not generate an itinerary automatically. \
                     Ask me anything about {}!",
                    self.destination.query
                );
                self.push(ChatMessage::assistant_plain(text))
            }
        }
    }

    /// Answer a follow-up question about the destination.
    ///
    /// Only an empty question is an error; a backend failure posts a single
    /// fallback message and keeps every marker.
    #[instrument(skip(self, question), fields(destination = %self.destination.query))]
    pub async fn ask(&mut self, question: &str) -> Result<&ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LawanderError::validation("Message cannot be empty").into());
        }
        self.push(ChatMessage::user(question));

        let prompt = follow_up_prompt(&self.destination.query, self.days, question);
        let message = match self.chat.complete(&prompt).await {
            Ok(reply) => self.annotate(&reply, ReplyLayout::Prose).await,
            Err(e) => {
                warn!("Chat request failed: {:#}", e);
                let text = LawanderError::chat(e.to_string()).user_message();
                self.push(ChatMessage::assistant_plain(text))
            }
        };
        Ok(message)
    }

    /// Resolve the places marked in `text`, merge them and post the
    /// highlighted reply
    pub async fn annotate(&mut self, text: &str, layout: ReplyLayout) -> &ChatMessage {
        let mentions = extract_mentions(text);
        let names = place_names(&mentions);
        let descriptions = extract_descriptions(text, &names);

        if !names.is_empty() {
            let found = self
                .scheduler
                .resolve_all(
                    &names,
                    &descriptions,
                    &self.destination,
                    self.store.points_of_interest(),
                )
                .await;
            let added = self.store.merge_points_of_interest(found);
            info!("{} of {} mentioned places added to the map", added, names.len());
        }

        let found = self.store.found_set();
        let html = match layout {
            ReplyLayout::Itinerary => {
                let itinerary = format_itinerary(text);
                let html = itinerary.render_html(&found);
                if self.itinerary.is_none() {
                    self.itinerary = Some(itinerary);
                }
                html
            }
            ReplyLayout::Prose => highlight(text, &found),
        };

        self.push(ChatMessage::new(Sender::Assistant, text, html))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.transcript.push(message);
        &self.transcript[self.transcript.len() - 1]
    }

    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    #[must_use]
    pub fn days(&self) -> u32 {
        self.days
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerStore {
        &self.store
    }

    #[must_use]
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    #[must_use]
    pub fn itinerary(&self) -> Option<&ItineraryLayout> {
        self.itinerary.as_ref()
    }

    /// Points of interest found so far
    #[must_use]
    pub fn found_places(&self) -> &[ResolvedPlace] {
        self.store.points_of_interest()
    }

    #[must_use]
    pub fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            destination: self.destination.clone(),
            days: self.days,
            markers: self.store.views(&self.destination.city),
            itinerary: self.itinerary.clone(),
            messages: self.transcript.clone(),
        }
    }
}
