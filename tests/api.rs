mod common;

use common::{FixedAuthor, Imgflip, dense_records, generated, record, spawn_app, DRAKE, TWO_BUTTONS};
use meme_roulette::in_memory::InMemoryMemeRepository;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;

const IMAGE: &str = "https://i.imgflip.com/7abc12.jpg";

async fn get(url: String) -> (StatusCode, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn post(url: String, body: Option<Value>) -> (StatusCode, Value) {
    let client = reqwest::Client::new();
    let mut request = client.post(url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let resp = request.send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

fn ok_author() -> FixedAuthor {
    FixedAuthor(Ok(generated()))
}

#[tokio::test]
async fn random_meme_is_rendered_and_annotated() {
    let repo = Arc::new(InMemoryMemeRepository::new(dense_records(4)));
    let base = spawn_app(repo.clone(), Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/random")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["templateId"], DRAKE);
    assert_eq!(body["imageUrl"], IMAGE);
    assert_eq!(body["captions"][0]["text"], "Writing code alone");
    assert!(
        body["invitationHtml"]
            .as_str()
            .unwrap()
            .ends_with(r#"<span class="hashtag">#rust</span> <span class="hashtag">#meetup</span>"#)
    );
    assert_eq!(body["createdAt"], "2023-03-14T15:09:26Z");
    assert_eq!(repo.count_calls(), 1);
    assert_eq!(repo.query_calls(), 1);
}

#[tokio::test]
async fn random_meme_from_empty_store_is_not_found() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo.clone(), Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/random")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    assert_eq!(repo.query_calls(), 0);
}

#[tokio::test]
async fn random_meme_with_no_record_at_index_is_not_found() {
    // every stored index is far outside the sampled range
    let repo = Arc::new(InMemoryMemeRepository::new(vec![
        record("a", 100, &["x", "y"]),
        record("b", 101, &["x", "y"]),
    ]));
    let base = spawn_app(repo, Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/random")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No meme could be found."}));
}

#[tokio::test]
async fn meme_by_id_returns_stored_meme() {
    let repo = Arc::new(InMemoryMemeRepository::new(dense_records(3)));
    let base = spawn_app(repo.clone(), Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/meme-2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imageUrl"], IMAGE);
    assert!(body["invitationHtml"].as_str().unwrap().starts_with("Come to meetup meme-2!"));
    assert_eq!(repo.count_calls(), 0);
    assert_eq!(repo.get_calls(), 1);
}

#[tokio::test]
async fn id_shadowed_by_static_route_is_reachable_by_id() {
    let repo = Arc::new(InMemoryMemeRepository::new(vec![record("random", 100, &["x", "y"])]));
    let base = spawn_app(repo.clone(), Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/by-id/random")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["invitationHtml"].as_str().unwrap().starts_with("Come to meetup random!"));
    assert_eq!(repo.get_calls(), 1);
    assert_eq!(repo.count_calls(), 0);

    let (status, _) = get(format!("{base}/api/memes/by-id/meme-9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let repo = Arc::new(InMemoryMemeRepository::new(dense_records(3)));
    let base = spawn_app(repo, Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No meme found."}));
}

#[tokio::test]
async fn generated_meme_is_rendered_without_created_at() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo.clone(), Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = post(format!("{base}/api/memes/create"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["templateId"], TWO_BUTTONS);
    assert_eq!(body["captions"].as_array().unwrap().len(), 3);
    assert_eq!(
        body["invitationHtml"],
        r#"Hack night is Thursday <span class="hashtag">#hacknight</span>"#
    );
    assert!(body.get("createdAt").is_none());
    assert_eq!(repo.count_calls() + repo.get_calls() + repo.query_calls(), 0);
}

#[tokio::test]
async fn renderer_rejection_is_reported_verbatim() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo, Imgflip::Rejects("Template not captionable."), ok_author()).await;

    let (status, body) = post(format!("{base}/api/memes/create"), None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "Template not captionable."}));
}

#[tokio::test]
async fn render_endpoint_creates_image() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo, Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = post(
        format!("{base}/api/memes/images/create/{DRAKE}"),
        Some(json!({"captions": ["Tabs", "Spaces"]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"imageUrl": IMAGE}));
}

#[tokio::test]
async fn render_endpoint_requires_captions() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo, Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = post(format!("{base}/api/memes/images/create/{DRAKE}"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Meme ID and captions are required."}));

    let (status, _) = post(
        format!("{base}/api/memes/images/create/{DRAKE}"),
        Some(json!({"captions": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn render_endpoint_rejects_unknown_template() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo, Imgflip::Succeeds(IMAGE), ok_author()).await;

    let (status, body) = post(
        format!("{base}/api/memes/images/create/42"),
        Some(json!({"captions": ["a"]})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Meme not found."}));
}

#[tokio::test]
async fn unavailable_renderer_is_a_generic_503() {
    let repo = Arc::new(InMemoryMemeRepository::new(dense_records(2)));
    let base = spawn_app(repo, Imgflip::Down, ok_author()).await;

    let (status, body) = get(format!("{base}/api/memes/meme-0")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Upstream service unavailable."}));
}

#[tokio::test]
async fn failed_authoring_is_unavailable() {
    let repo = Arc::new(InMemoryMemeRepository::new(Vec::new()));
    let base = spawn_app(repo, Imgflip::Succeeds(IMAGE), FixedAuthor(Err("model returned prose"))).await;

    let (status, body) = post(format!("{base}/api/memes/create"), None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Upstream service unavailable.");
}
