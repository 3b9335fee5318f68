//! OpenAI-compatible chat-completions client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use super::ChatBackend;
use crate::LawanderError;
use crate::config::ChatConfig;

pub struct OpenAiChat {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("Lawander/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create chat HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiChat {
    #[instrument(name = "chat_complete", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LawanderError::config("chat.api_key is not set"))?;

        let request = raw::CompletionRequest {
            model: &self.model,
            messages: vec![raw::RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LawanderError::chat(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LawanderError::chat(format!("Backend returned HTTP {status}")).into());
        }

        let body: raw::CompletionResponse = response
            .json()
            .await
            .map_err(|e| LawanderError::chat(format!("Unreadable response: {e}")))?;

        let reply = body.into_reply()?;
        debug!("Chat reply with {} characters", reply.len());
        Ok(reply)
    }
}

mod raw {
    use serde::{Deserialize, Serialize};

    use crate::LawanderError;

    #[derive(Serialize)]
    pub struct CompletionRequest<'a> {
        pub model: &'a str,
        pub messages: Vec<RequestMessage<'a>>,
    }

    #[derive(Serialize)]
    pub struct RequestMessage<'a> {
        pub role: &'a str,
        pub content: &'a str,
    }

    #[derive(Debug, Deserialize)]
    pub struct CompletionResponse {
        pub choices: Vec<Choice>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Choice {
        pub message: ResponseMessage,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseMessage {
        pub content: Option<String>,
    }

    impl CompletionResponse {
        pub fn into_reply(self) -> crate::Result<String> {
            self.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|content| !content.trim().is_empty())
                .ok_or_else(|| LawanderError::chat("Empty reply"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_is_first_choice() {
        let body: raw::CompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Day 1: **Louvre**"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_reply().unwrap(), "Day 1: **Louvre**");
    }

    #[test]
    fn test_empty_reply_is_an_error() {
        let body: raw::CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(body.into_reply(), Err(LawanderError::Chat { .. })));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_sending() {
        let chat = OpenAiChat::new(&ChatConfig::default()).unwrap();
        let err = chat.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }
}
