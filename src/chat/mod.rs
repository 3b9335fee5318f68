//! Chat backend integration
//!
//! The engine only sends single free-text prompts and reads single free-text
//! replies. Calls are never retried: a failure is reported once to the user.

use anyhow::Result;
use async_trait::async_trait;

pub mod openai;

pub use openai::OpenAiChat;

/// Single-turn text completion
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Prompt asking for a day-by-day itinerary with marked place names
#[must_use]
pub fn itinerary_prompt(destination: &str, days: u32) -> String {
    format!(
        "Create a {days}-day travel itinerary for {destination}. \
         Start every day with a line of the form \"Day N: <theme>\" and list the \
         activities of that day below it, one per line. \
         Wrap the name of every real place (sights, museums, restaurants, parks) \
         in double asterisks, like **Louvre Museum**, and describe each place in \
         one short sentence."
    )
}

/// Prompt for a follow-up question, scoped to the trip's destination
#[must_use]
pub fn follow_up_prompt(destination: &str, days: u32, question: &str) -> String {
    format!(
        "Context: The user is planning a {days}-day trip to {destination}. \
         Please provide information specifically about {destination} and its \
         attractions, restaurants, activities, etc. \
         Wrap the name of every real place you mention in double asterisks. \
         User question: {question}"
    )
}
