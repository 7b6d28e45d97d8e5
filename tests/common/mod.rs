#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Json, Router, http::StatusCode, routing::post};
use chrono::{TimeZone, Utc};
use meme_roulette::{
    AppState,
    domain::MemeAuthor,
    errors::AuthorError,
    in_memory::InMemoryMemeRepository,
    models::{CaptionLine, GeneratedMeme, MemeRecord, MemeTemplate},
    pipeline::MemePipeline,
    renderer::{ImgflipCredentials, ImgflipRenderer},
    routes::create_router,
    templates::TemplateCatalog,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const DRAKE: &str = "181913649";
pub const TWO_BUTTONS: &str = "87743020";

pub fn catalog() -> Arc<TemplateCatalog> {
    Arc::new(TemplateCatalog::new(vec![
        MemeTemplate {
            id: DRAKE.to_string(),
            name: "Drake Hotline Bling".to_string(),
            url: "https://i.imgflip.com/30b1gx.jpg".to_string(),
            box_count: 2,
            description: String::new(),
        },
        MemeTemplate {
            id: TWO_BUTTONS.to_string(),
            name: "Two Buttons".to_string(),
            url: "https://i.imgflip.com/1g8my4.jpg".to_string(),
            box_count: 3,
            description: String::new(),
        },
    ]))
}

pub fn record(id: &str, random_index: u64, captions: &[&str]) -> MemeRecord {
    MemeRecord {
        id: id.to_string(),
        template_id: DRAKE.to_string(),
        captions: captions.iter().map(|c| CaptionLine::new(*c)).collect(),
        invitation_text: format!("Come to meetup {id}! #rust #meetup"),
        random_index,
        created_at: Utc.with_ymd_and_hms(2023, 3, 14, 15, 9, 26).unwrap(),
    }
}

/// Records covering every index in `0..n`, so any sampled index hits one.
pub fn dense_records(n: u64) -> Vec<MemeRecord> {
    (0..n)
        .map(|i| record(&format!("meme-{i}"), i, &["Writing code alone", "Writing code at meetups"]))
        .collect()
}

pub struct FixedAuthor(pub Result<GeneratedMeme, &'static str>);

#[async_trait]
impl MemeAuthor for FixedAuthor {
    async fn author(&self) -> Result<GeneratedMeme, AuthorError> {
        match &self.0 {
            Ok(meme) => Ok(meme.clone()),
            Err(reason) => Err(AuthorError::InvalidResponse(reason.to_string())),
        }
    }
}

pub fn generated() -> GeneratedMeme {
    GeneratedMeme {
        template_id: TWO_BUTTONS.to_string(),
        captions: vec!["Stay home".into(), "Come to hack night".into(), "Me".into()],
        invitation: "Hack night is Thursday #hacknight".into(),
    }
}

pub enum Imgflip {
    Succeeds(&'static str),
    Rejects(&'static str),
    Down,
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}", addr)
}

pub async fn spawn_imgflip(behaviour: Imgflip) -> String {
    let app = match behaviour {
        Imgflip::Succeeds(url) => Router::new().route(
            "/caption_image",
            post(move || async move { Json(json!({"success": true, "data": {"url": url}})) }),
        ),
        Imgflip::Rejects(message) => Router::new().route(
            "/caption_image",
            post(move || async move { Json(json!({"success": false, "error_message": message})) }),
        ),
        Imgflip::Down => Router::new().route(
            "/caption_image",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ),
    };
    format!("{}/caption_image", serve(app).await)
}

/// Serves the full API over the in-memory store and a fake Imgflip.
pub async fn spawn_app(
    repo: Arc<InMemoryMemeRepository>,
    imgflip: Imgflip,
    author: FixedAuthor,
) -> String {
    let catalog = catalog();
    let renderer = ImgflipRenderer::new(
        reqwest::Client::new(),
        spawn_imgflip(imgflip).await,
        ImgflipCredentials {
            username: "bcoe".into(),
            password: "hunter2".into(),
        },
        catalog,
    )
    .with_retry_budget(Duration::from_millis(300));
    let pipeline = MemePipeline::new(repo, Arc::new(renderer), Arc::new(author))
        .with_call_timeout(Duration::from_secs(5));
    serve(create_router(Arc::new(AppState { pipeline }))).await
}
