use meme_roulette::{
    author::OpenAiMemeAuthor,
    clients::{create_dynamodb_client, create_http_client, create_sdk_config},
    config::Config,
    errors::AppError,
    pipeline::MemePipeline,
    renderer::{ImgflipCredentials, ImgflipRenderer},
    repositories::DynamoDbMemeRepository,
    routes::create_router,
    startup::ensure_memes_table,
    templates::TemplateCatalog,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "meme_roulette=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(?config, "Configuration loaded");

    // --- Clients ---
    let sdk_config = create_sdk_config(&config).await?;
    let db_client = create_dynamodb_client(&sdk_config);
    let http_client = create_http_client(&config)?;

    if config.ensure_table {
        tracing::info!("Attempting to ensure DynamoDB table exists...");
        ensure_memes_table(&db_client, &config.table_name).await?;
    }

    let catalog = Arc::new(TemplateCatalog::load(&config.template_catalog_path)?);
    if catalog.is_empty() {
        tracing::warn!(path = %config.template_catalog_path, "Template catalog is empty; every render will be rejected");
    }

    // --- Gateways ---
    let repo = DynamoDbMemeRepository::new(db_client, config.table_name.clone());
    let renderer = ImgflipRenderer::new(
        http_client.clone(),
        config.imgflip_api_url.clone(),
        ImgflipCredentials {
            username: config.imgflip_username.clone(),
            password: config.imgflip_password.clone(),
        },
        catalog.clone(),
    )
    .with_retry_budget(config.render_retry_max_elapsed);
    let author = OpenAiMemeAuthor::new(
        http_client,
        config.openai_api_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.meme_topic.clone(),
        catalog,
    );

    let pipeline = MemePipeline::new(Arc::new(repo), Arc::new(renderer), Arc::new(author))
        .with_call_timeout(config.upstream_timeout)
        .with_author_timeout(config.generation_timeout);

    let state = Arc::new(AppState { pipeline });
    let app = create_router(state);

    tracing::info!("Server listening on http://{}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
