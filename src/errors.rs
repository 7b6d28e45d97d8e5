use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Shown when the sampled index matches no stored record.
pub const NO_RANDOM_MEME: &str = "No meme could be found.";
/// Shown when a record looked up by id is missing or not renderable.
pub const NO_MEME_BY_ID: &str = "No meme found.";
/// Shown when a template id is not in the catalog.
pub const UNKNOWN_TEMPLATE: &str = "Meme not found.";
/// Generic renderer failure when the remote service gave no reason.
pub const RENDER_FAILED: &str = "Error creating meme.";
/// Client-facing text for any upstream outage; the detail is only logged.
pub const UPSTREAM_UNAVAILABLE: &str = "Upstream service unavailable.";

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Database backend error: {0:#}")]
    BackendError(#[from] anyhow::Error),

    #[error("Stored meme data is invalid: {0}")]
    DataCorruption(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Meme not found.")]
    UnknownTemplate(String),

    // Remote message, passed through verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("Caption service unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum AuthorError {
    #[error("Text generation service unavailable: {0:#}")]
    Unavailable(anyhow::Error),

    #[error("Text generation returned an unusable meme: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unable to read template catalog '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse template catalog '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SamplingError {
    #[error("No memes are available.")]
    NoRecords,
}

// --- Pipeline Errors ---

/// Terminal failure of a pipeline run. The message is what the caller sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Render(String),
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error("{0}")]
    InvalidInput(String),
}

impl From<RepoError> for PipelineError {
    fn from(err: RepoError) -> Self {
        PipelineError::UpstreamUnavailable(err.to_string())
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        match err {
            e @ RenderError::UnknownTemplate(_) => PipelineError::NotFound(e.to_string()),
            RenderError::Rejected(msg) => PipelineError::Render(msg),
            e @ RenderError::Unavailable(_) => PipelineError::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl From<AuthorError> for PipelineError {
    fn from(err: AuthorError) -> Self {
        PipelineError::UpstreamUnavailable(err.to_string())
    }
}

impl From<SamplingError> for PipelineError {
    fn from(err: SamplingError) -> Self {
        PipelineError::NotFound(err.to_string())
    }
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Render failed: {0}")]
    Render(String),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(msg) => AppError::NotFound(msg),
            PipelineError::Render(msg) => AppError::Render(msg),
            PipelineError::UpstreamUnavailable(msg) => AppError::UpstreamUnavailable(msg),
            PipelineError::InvalidInput(msg) => AppError::InvalidInput(msg),
        }
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::InitError(err.to_string())
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for AppError {
    fn from(err: aws_smithy_types::error::operation::BuildError) -> Self {
        AppError::InitError(format!("Failed to build AWS request: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),

            // Upstream failures
            AppError::Render(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::UpstreamUnavailable(detail) => {
                tracing::error!(error.detail = %detail, "Upstream service failure");
                (StatusCode::SERVICE_UNAVAILABLE, UPSTREAM_UNAVAILABLE.to_string())
            }

            // 5xx Server Errors
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error".to_string())
            }
            AppError::InitError(msg) => {
                tracing::error!("Initialization error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server initialization error".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error.message = %error_message, error.status = %status, "Responding with error");
        } else {
            tracing::debug!(error.message = %error_message, error.status = %status, "Responding with error");
        }

        let body = Json(serde_json::json!({ "error": error_message }));
        (status, body).into_response()
    }
}
