pub mod annotate;
pub mod author;
pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod pipeline;
pub mod renderer;
pub mod repositories;
pub mod routes;
pub mod sampling;
pub mod startup;
pub mod templates;

use pipeline::MemePipeline;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: MemePipeline,
}
