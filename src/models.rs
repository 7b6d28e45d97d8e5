use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text for one numbered box of a template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CaptionLine {
    pub text: String,
}

impl CaptionLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A stored meme definition. `random_index` is assigned by the store when the
/// record is written and is the key used for random sampling.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemeRecord {
    pub id: String,
    pub template_id: String,
    pub captions: Vec<CaptionLine>,
    pub invitation_text: String,
    pub random_index: u64,
    pub created_at: DateTime<Utc>,
}

impl MemeRecord {
    /// Caption texts in box order, as sent to the renderer.
    pub fn caption_texts(&self) -> Vec<String> {
        self.captions.iter().map(|c| c.text.clone()).collect()
    }

    pub fn has_captions(&self) -> bool {
        !self.captions.is_empty()
    }

    pub fn has_invitation(&self) -> bool {
        !self.invitation_text.is_empty()
    }
}

/// A freshly authored meme from the text generator. Never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMeme {
    pub template_id: String,
    pub captions: Vec<String>,
    pub invitation: String,
}

/// Display-ready result of one pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMeme {
    pub captions: Vec<CaptionLine>,
    pub template_id: String,
    pub invitation_html: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A captioning layout known to the renderer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemeTemplate {
    pub id: String,
    pub name: String,
    pub url: String,
    pub box_count: usize,
    #[serde(default)]
    pub description: String,
}
