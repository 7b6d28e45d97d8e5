use crate::{
    errors::AppError,
    models::RenderedMeme,
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing;

#[derive(Deserialize, Debug, Default)]
pub struct RenderRequest {
    #[serde(default)]
    pub captions: Option<Vec<String>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub image_url: String,
}

/// Handler for GET /api/memes/random
pub async fn get_random_meme(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RenderedMeme>, AppError> {
    tracing::debug!("Fetching random meme via handler");
    let meme = state.pipeline.random_meme().await?;
    Ok(Json(meme))
}

/// Handler for GET /api/memes/{id}
pub async fn get_meme_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RenderedMeme>, AppError> {
    tracing::debug!(meme_id = %id, "Fetching meme via handler");
    let meme = state.pipeline.meme_by_id(&id).await?;
    Ok(Json(meme))
}

/// Handler for POST /api/memes/create
pub async fn generate_meme(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RenderedMeme>, AppError> {
    tracing::debug!("Generating meme via handler");
    let meme = state.pipeline.generate_meme().await?;
    tracing::info!(template_id = %meme.template_id, "Meme generated successfully via handler");
    Ok(Json(meme))
}

/// Handler for POST /api/memes/images/create/{template_id}
pub async fn render_meme_image(
    State(state): State<Arc<AppState>>,
    Path(template_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: RenderRequest = if body.is_empty() {
        RenderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))?
    };
    let captions = request.captions.unwrap_or_default();
    tracing::debug!(%template_id, captions = captions.len(), "Rendering meme image via handler");

    let image_url = state.pipeline.render_captions(&template_id, &captions).await?;

    tracing::info!(%template_id, %image_url, "Meme image created successfully via handler");
    Ok((StatusCode::CREATED, Json(RenderResponse { image_url })))
}
