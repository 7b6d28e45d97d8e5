use crate::{
    domain::CaptionRenderer,
    errors::{RENDER_FAILED, RenderError},
    templates::TemplateCatalog,
};
use anyhow::Context;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::Deserialize;
use std::{fmt, sync::Arc, time::Duration};

pub const IMGFLIP_CAPTION_URL: &str = "https://api.imgflip.com/caption_image";

const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct ImgflipCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ImgflipCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgflipCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Debug)]
struct CaptionResponse {
    #[serde(default)]
    success: bool,
    data: Option<CaptionData>,
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CaptionData {
    url: String,
}

/// Renders captions through Imgflip's `caption_image` API.
///
/// Unknown templates are rejected locally. Transport failures and 5xx/429
/// responses are retried with exponential backoff; a response that says the
/// captioning failed is returned at once with Imgflip's own message.
#[derive(Debug, Clone)]
pub struct ImgflipRenderer {
    client: reqwest::Client,
    api_url: String,
    credentials: ImgflipCredentials,
    catalog: Arc<TemplateCatalog>,
    retry_max_elapsed: Duration,
}

impl ImgflipRenderer {
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        credentials: ImgflipCredentials,
        catalog: Arc<TemplateCatalog>,
    ) -> Self {
        tracing::info!(%api_url, username = %credentials.username, "Initializing ImgflipRenderer");
        Self {
            client,
            api_url,
            credentials,
            catalog,
            retry_max_elapsed: Duration::from_secs(3),
        }
    }

    /// Total time spent retrying transient failures before giving up.
    pub fn with_retry_budget(mut self, max_elapsed: Duration) -> Self {
        self.retry_max_elapsed = max_elapsed;
        self
    }

    // Captions map to numbered boxes in their original order.
    fn form(&self, template_id: &str, captions: &[String]) -> Vec<(String, String)> {
        let mut form = vec![
            ("template_id".to_string(), template_id.to_string()),
            ("username".to_string(), self.credentials.username.clone()),
            ("password".to_string(), self.credentials.password.clone()),
        ];
        form.extend(
            captions
                .iter()
                .enumerate()
                .map(|(index, caption)| (format!("boxes[{}][text]", index), caption.clone())),
        );
        form
    }

    async fn caption_once(&self, template_id: &str, captions: &[String]) -> Result<String, RenderError> {
        let resp = self
            .client
            .post(&self.api_url)
            .form(&self.form(template_id, captions))
            .send()
            .await
            .context(format!("Imgflip: caption request for template '{}' failed", template_id))
            .map_err(RenderError::Unavailable)?;

        let status = resp.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RenderError::Unavailable(anyhow::anyhow!(
                "Imgflip responded with {}",
                status
            )));
        }
        if !status.is_success() {
            // Imgflip still explains most 4xx rejections in the usual body shape
            let error_message = resp
                .json::<CaptionResponse>()
                .await
                .ok()
                .and_then(|body| body.error_message);
            let reason = rejection_reason(error_message);
            tracing::warn!(template_id, %status, %reason, "Imgflip: caption request rejected");
            return Err(RenderError::Rejected(reason));
        }

        let body: CaptionResponse = resp
            .json()
            .await
            .context("Imgflip: unreadable caption response")
            .map_err(RenderError::Unavailable)?;

        match body {
            CaptionResponse {
                success: true,
                data: Some(CaptionData { url }),
                ..
            } if !url.is_empty() => {
                tracing::debug!(template_id, %url, "Imgflip: caption successful");
                Ok(url)
            }
            CaptionResponse { error_message, .. } => {
                let reason = rejection_reason(error_message);
                tracing::warn!(template_id, %reason, "Imgflip: captioning failed");
                Err(RenderError::Rejected(reason))
            }
        }
    }
}

/// Imgflip's own message when it gave one, else the generic failure text.
fn rejection_reason(error_message: Option<String>) -> String {
    error_message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| RENDER_FAILED.to_string())
}

#[async_trait]
impl CaptionRenderer for ImgflipRenderer {
    async fn render(&self, template_id: &str, captions: &[String]) -> Result<String, RenderError> {
        if !self.catalog.contains(template_id) {
            tracing::warn!(template_id, "Imgflip: template not in catalog");
            return Err(RenderError::UnknownTemplate(template_id.to_string()));
        }

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(RETRY_INITIAL_INTERVAL)
            .with_max_elapsed_time(Some(self.retry_max_elapsed))
            .build();

        backoff::future::retry(policy, || async move {
            self.caption_once(template_id, captions)
                .await
                .map_err(|err| match err {
                    e @ RenderError::Unavailable(_) => {
                        tracing::warn!(template_id, error = %e, "Imgflip: transient failure, retrying");
                        backoff::Error::transient(e)
                    }
                    e => backoff::Error::permanent(e),
                })
        })
        .await
    }
}
