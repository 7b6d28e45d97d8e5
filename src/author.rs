//! Meme authoring through an OpenAI-compatible chat completions endpoint.

use crate::{
    domain::MemeAuthor,
    errors::AuthorError,
    models::GeneratedMeme,
    templates::TemplateCatalog,
};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TOPIC: &str = "inviting developers to join our open source community meetups";

#[derive(Debug, Clone)]
pub struct OpenAiMemeAuthor {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    topic: String,
    catalog: Arc<TemplateCatalog>,
}

impl OpenAiMemeAuthor {
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        api_key: String,
        model: String,
        topic: String,
        catalog: Arc<TemplateCatalog>,
    ) -> Self {
        tracing::info!(%api_url, %model, "Initializing OpenAiMemeAuthor");
        Self {
            client,
            api_url,
            api_key,
            model,
            topic,
            catalog,
        }
    }

    fn prompt(&self) -> String {
        let templates = self
            .catalog
            .templates()
            .iter()
            .map(|t| {
                format!(
                    "- id {}: \"{}\" ({} boxes) {}",
                    t.id, t.name, t.box_count, t.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Create a funny meme about {topic}.

Pick exactly one of these templates:
{templates}

Write one caption per box, in box order, and a short invitation message for
the post that ends with two or three hashtags.

Return ONLY valid JSON, no markdown:
{{"templateId": "<template id>", "captions": ["<box 1>", "<box 2>"], "invitation": "<message>"}}"#,
            topic = self.topic,
        )
    }

    /// Checks a parsed reply against the catalog.
    fn validate(&self, meme: GeneratedMeme) -> Result<GeneratedMeme, AuthorError> {
        let template = self.catalog.get(&meme.template_id).ok_or_else(|| {
            AuthorError::InvalidResponse(format!("unknown template '{}'", meme.template_id))
        })?;
        if meme.captions.is_empty() {
            return Err(AuthorError::InvalidResponse("no captions".to_string()));
        }
        if meme.captions.len() > template.box_count {
            return Err(AuthorError::InvalidResponse(format!(
                "{} captions for a template with {} boxes",
                meme.captions.len(),
                template.box_count
            )));
        }
        if meme.invitation.trim().is_empty() {
            return Err(AuthorError::InvalidResponse("empty invitation".to_string()));
        }
        Ok(meme)
    }
}

#[async_trait]
impl MemeAuthor for OpenAiMemeAuthor {
    async fn author(&self) -> Result<GeneratedMeme, AuthorError> {
        let request_body = serde_json::json!({
            "model": self.model,
            "temperature": 0.9,
            "messages": [
                {
                    "role": "system",
                    "content": "You write short, friendly, workplace-safe memes."
                },
                {
                    "role": "user",
                    "content": self.prompt()
                }
            ]
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .context("OpenAI: chat completion request failed")
            .map_err(AuthorError::Unavailable)?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(AuthorError::Unavailable(anyhow::anyhow!(
                "OpenAI responded with {}: {}",
                status,
                error
            )));
        }

        let api_response: serde_json::Value = response
            .json()
            .await
            .context("OpenAI: unreadable chat completion response")
            .map_err(AuthorError::Unavailable)?;

        let content = api_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AuthorError::InvalidResponse("missing message content".to_string()))?;

        let meme = parse_generated(content)?;
        tracing::debug!(template_id = %meme.template_id, captions = meme.captions.len(), "OpenAI: authored meme");
        self.validate(meme)
    }
}

/// Parses the model's reply, tolerating a surrounding Markdown code fence.
fn parse_generated(content: &str) -> Result<GeneratedMeme, AuthorError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(json)
        .map_err(|e| AuthorError::InvalidResponse(format!("reply is not a meme object: {}", e)))
}
