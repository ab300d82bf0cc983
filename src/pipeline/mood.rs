use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::utils::config::MOOD_TEMPERATURE;

pub const SYSTEM_PROMPT: &str = "You are a professional music curator and psychologist.";

/// Produces the playlist blurb shown next to a detection.
#[async_trait]
pub trait MoodWriter: Send + Sync {
    async fn write_mood(&self, emotion: &str, confidence: f64) -> Result<String>;
}

/// User prompt for a detected emotion.
pub fn build_prompt(emotion: &str, confidence: f64) -> String {
    format!(
        "The detected emotion is {emotion}. Suggest a 3-song playlist that matches it. \
         Start by saying: 'Tonight's vibe is {emotion}. I'm {confidence:.1}% sure about it... \
         (here give a short description of the mood)... For that reason, here are some songs \
         to match the mood.' and then give the playlist you suggest. No final questions or suggestions."
    )
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

/// Ollama `/api/chat` client with a fixed model and temperature.
pub struct OllamaMoodWriter {
    client: reqwest::Client,
    chat_url: String,
    model: String,
}

impl OllamaMoodWriter {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl MoodWriter for OllamaMoodWriter {
    async fn write_mood(&self, emotion: &str, confidence: f64) -> Result<String> {
        let prompt = build_prompt(emotion, confidence);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            stream: false,
            options: ChatOptions { temperature: MOOD_TEMPERATURE },
        };

        debug!("Requesting mood text from {} (model={})", self.chat_url, self.model);
        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Text generator unreachable at {}", self.chat_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .with_context(|| format!("Text generator returned HTTP {} with an unreadable body", status))?;
            anyhow::bail!("Text generator returned HTTP {}: {}", status, text.trim());
        }

        let reply: ChatReply = response.json().await.context("Unexpected text generator response")?;
        let content = reply.message.content.trim().to_string();
        if content.is_empty() {
            anyhow::bail!("Text generator returned an empty reply");
        }
        info!("Generated {} chars of mood text for {}", content.len(), emotion);
        Ok(content)
    }
}
