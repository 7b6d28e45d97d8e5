use crate::{author, renderer};
use std::{env, net::SocketAddr, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
    #[error(transparent)]
    DotEnvError(#[from] dotenvy::Error),
}

#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub table_name: String,
    // Region as a string; clients::create_sdk_config converts it
    pub aws_region: String,
    // Optional endpoint for LocalStack
    pub localstack_endpoint: Option<String>,
    /// Create the table and its random index at startup.
    pub ensure_table: bool,
    pub imgflip_username: String,
    pub imgflip_password: String,
    pub imgflip_api_url: String,
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub meme_topic: String,
    pub template_catalog_path: String,
    /// Per-call timeout for store and renderer calls.
    pub upstream_timeout: Duration,
    pub generation_timeout: Duration,
    pub render_retry_max_elapsed: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("table_name", &self.table_name)
            .field("aws_region", &self.aws_region)
            .field("localstack_endpoint", &self.localstack_endpoint)
            .field("ensure_table", &self.ensure_table)
            .field("imgflip_username", &self.imgflip_username)
            .field("imgflip_api_url", &self.imgflip_api_url)
            .field("openai_api_url", &self.openai_api_url)
            .field("openai_model", &self.openai_model)
            .field("template_catalog_path", &self.template_catalog_path)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("generation_timeout", &self.generation_timeout)
            .field("render_retry_max_elapsed", &self.render_retry_max_elapsed)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables, reading `.env` first
    /// when one exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.into()))
        };

        let bind_address_str = var("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let ensure_table = parse_bool("ENSURE_TABLE", &var("ENSURE_TABLE", "false"))?;

        let upstream_timeout =
            Duration::from_secs(parse_number("UPSTREAM_TIMEOUT_SECS", &var("UPSTREAM_TIMEOUT_SECS", "10"))?);
        let generation_timeout = Duration::from_secs(parse_number(
            "GENERATION_TIMEOUT_SECS",
            &var("GENERATION_TIMEOUT_SECS", "30"),
        )?);
        let render_retry_max_elapsed = Duration::from_millis(parse_number(
            "RENDER_RETRY_MAX_ELAPSED_MS",
            &var("RENDER_RETRY_MAX_ELAPSED_MS", "3000"),
        )?);

        Ok(Config {
            bind_address,
            table_name: var("MEMES_TABLE_NAME", "memes"),
            aws_region: var("AWS_DEFAULT_REGION", "ca-central-1"),
            localstack_endpoint: lookup("AWS_ENDPOINT_URL"),
            ensure_table,
            imgflip_username: required("IMGFLIP_USERNAME")?,
            imgflip_password: required("IMGFLIP_PASSWORD")?,
            imgflip_api_url: var("IMGFLIP_API_URL", renderer::IMGFLIP_CAPTION_URL),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_api_url: var("OPENAI_API_URL", author::OPENAI_CHAT_URL),
            openai_model: var("OPENAI_MODEL", author::DEFAULT_MODEL),
            meme_topic: var("MEME_TOPIC", author::DEFAULT_TOPIC),
            template_catalog_path: var("TEMPLATE_CATALOG_PATH", "public/memes.json"),
            upstream_timeout,
            generation_timeout,
            render_retry_max_elapsed,
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidVar(key.into(), "must be greater than zero".into())),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidVar(key.into(), e.to_string())),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidVar(key.into(), format!("expected a boolean, got '{}'", other))),
    }
}
