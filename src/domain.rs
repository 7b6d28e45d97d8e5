use crate::errors::{AuthorError, RenderError, RepoError};
use crate::models::{GeneratedMeme, MemeRecord};
use async_trait::async_trait;

/// Attribute holding each record's sampling key.
pub const RANDOM_INDEX_FIELD: &str = "random_index";

/// Read access to stored meme records. An instance is bound to one collection.
#[async_trait]
pub trait MemeRepository: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Number of records in the collection. May be eventually consistent.
    async fn count(&self) -> Result<u64, RepoError>;

    /// Up to `limit` records whose integer attribute `field` equals `value`.
    /// No ordering guarantee.
    async fn query_by_field(
        &self,
        field: &str,
        value: u64,
        limit: usize,
    ) -> Result<Vec<MemeRecord>, RepoError>;

    /// Returns Ok(None) if the record is not found.
    async fn get_by_id(&self, id: &str) -> Result<Option<MemeRecord>, RepoError>;
}

/// Turns a template and ordered captions into a rendered image.
#[async_trait]
pub trait CaptionRenderer: Send + Sync + 'static {
    /// Caption `i` goes into box `i` of the template. Returns the image URL.
    async fn render(&self, template_id: &str, captions: &[String]) -> Result<String, RenderError>;
}

/// Authors brand-new memes (template, captions and invitation text).
#[async_trait]
pub trait MemeAuthor: Send + Sync + 'static {
    async fn author(&self) -> Result<GeneratedMeme, AuthorError>;
}
