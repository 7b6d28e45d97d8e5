//! Retrieval and generation pipelines.
//!
//! Every run walks an explicit state machine and owns its own [`PipelineRun`];
//! nothing is shared between runs except the `Arc`ed gateways.

use crate::annotate::annotate;
use crate::domain::{CaptionRenderer, MemeAuthor, MemeRepository, RANDOM_INDEX_FIELD};
use crate::errors::{AuthorError, NO_MEME_BY_ID, NO_RANDOM_MEME, PipelineError, RENDER_FAILED};
use crate::models::{CaptionLine, MemeRecord, RenderedMeme};
use crate::sampling::{SelectionSeed, select_index};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_AUTHOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CountingTotal,
    Sampling,
    FetchingRecord,
    Authoring,
    Rendering,
    Annotating,
    Done,
    Failed(String),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }

    fn allows(&self, next: &PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Done | Failed(_), _) => false,
            (Idle, Failed(_)) => false,
            (_, Failed(_)) => true,
            (Idle, CountingTotal | FetchingRecord | Authoring) => true,
            (CountingTotal, Sampling) => true,
            (Sampling, FetchingRecord) => true,
            (FetchingRecord | Authoring, Rendering) => true,
            (Rendering, Annotating) => true,
            (Annotating, Done) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEntry {
    Random,
    ById,
    Generate,
}

/// State of one pipeline execution, with the trail of states it went through.
#[derive(Debug)]
pub struct PipelineRun {
    id: Uuid,
    entry: PipelineEntry,
    state: PipelineState,
    trail: Vec<PipelineState>,
}

impl PipelineRun {
    pub fn new(entry: PipelineEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry,
            state: PipelineState::Idle,
            trail: vec![PipelineState::Idle],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entry(&self) -> PipelineEntry {
        self.entry
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn trail(&self) -> &[PipelineState] {
        &self.trail
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.allows(&next),
            "illegal pipeline transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(run_id = %self.id, entry = ?self.entry, from = ?self.state, to = ?next, "Pipeline transition");
        self.state = next.clone();
        self.trail.push(next);
    }

    fn finish(&mut self, outcome: Result<RenderedMeme, PipelineError>) -> Result<RenderedMeme, PipelineError> {
        match outcome {
            Ok(meme) => {
                self.advance(PipelineState::Done);
                tracing::info!(run_id = %self.id, entry = ?self.entry, template_id = %meme.template_id, "Pipeline run complete");
                Ok(meme)
            }
            Err(err) => {
                tracing::warn!(run_id = %self.id, entry = ?self.entry, state = ?self.state, reason = %err, "Pipeline run failed");
                self.advance(PipelineState::Failed(err.to_string()));
                Err(err)
            }
        }
    }
}

/// Composes the record store, caption renderer and meme author into the
/// inbound operations. Cheap to clone.
#[derive(Clone)]
pub struct MemePipeline {
    repo: Arc<dyn MemeRepository>,
    renderer: Arc<dyn CaptionRenderer>,
    author: Arc<dyn MemeAuthor>,
    call_timeout: Duration,
    author_timeout: Duration,
}

impl MemePipeline {
    pub fn new(
        repo: Arc<dyn MemeRepository>,
        renderer: Arc<dyn CaptionRenderer>,
        author: Arc<dyn MemeAuthor>,
    ) -> Self {
        Self {
            repo,
            renderer,
            author,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            author_timeout: DEFAULT_AUTHOR_TIMEOUT,
        }
    }

    /// Timeout applied to each store and renderer call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Timeout applied to the text generation call.
    pub fn with_author_timeout(mut self, timeout: Duration) -> Self {
        self.author_timeout = timeout;
        self
    }

    pub async fn random_meme(&self) -> Result<RenderedMeme, PipelineError> {
        let mut run = PipelineRun::new(PipelineEntry::Random);
        self.run_random(&mut run, SelectionSeed::fresh()).await
    }

    pub async fn meme_by_id(&self, id: &str) -> Result<RenderedMeme, PipelineError> {
        let mut run = PipelineRun::new(PipelineEntry::ById);
        self.run_by_id(&mut run, id).await
    }

    pub async fn generate_meme(&self) -> Result<RenderedMeme, PipelineError> {
        let mut run = PipelineRun::new(PipelineEntry::Generate);
        self.run_generate(&mut run).await
    }

    /// Count, sample an index, fetch the record holding it, render, annotate.
    ///
    /// A sampled index that matches no record is a normal not-found outcome;
    /// the run does not re-sample.
    pub async fn run_random(
        &self,
        run: &mut PipelineRun,
        seed: SelectionSeed,
    ) -> Result<RenderedMeme, PipelineError> {
        let outcome = self.random_steps(run, seed).await;
        run.finish(outcome)
    }

    /// Fetch by id, render, annotate. Blank ids are rejected before the run
    /// leaves `Idle`.
    pub async fn run_by_id(&self, run: &mut PipelineRun, id: &str) -> Result<RenderedMeme, PipelineError> {
        if id.trim().is_empty() {
            return Err(PipelineError::InvalidInput("Meme ID is required.".to_string()));
        }
        let outcome = self.by_id_steps(run, id).await;
        run.finish(outcome)
    }

    /// Author a new meme, render, annotate. The result is not stored.
    pub async fn run_generate(&self, run: &mut PipelineRun) -> Result<RenderedMeme, PipelineError> {
        let outcome = self.generate_steps(run).await;
        run.finish(outcome)
    }

    /// Renders captions onto a template without touching the store.
    pub async fn render_captions(
        &self,
        template_id: &str,
        captions: &[String],
    ) -> Result<String, PipelineError> {
        if template_id.trim().is_empty() || captions.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Meme ID and captions are required.".to_string(),
            ));
        }
        self.render_image(template_id, captions).await
    }

    async fn random_steps(
        &self,
        run: &mut PipelineRun,
        seed: SelectionSeed,
    ) -> Result<RenderedMeme, PipelineError> {
        run.advance(PipelineState::CountingTotal);
        let total = bounded("count", self.call_timeout, self.repo.count()).await?;

        run.advance(PipelineState::Sampling);
        let index = select_index(total, &seed)?;
        tracing::debug!(run_id = %run.id(), total, index, seed = seed.as_str(), "Sampled random index");

        run.advance(PipelineState::FetchingRecord);
        let matches = bounded(
            "query",
            self.call_timeout,
            self.repo.query_by_field(RANDOM_INDEX_FIELD, index, 1),
        )
        .await?;
        let record = matches
            .into_iter()
            .next()
            .filter(MemeRecord::has_captions)
            .ok_or_else(|| PipelineError::NotFound(NO_RANDOM_MEME.to_string()))?;

        self.render_record(run, record).await
    }

    async fn by_id_steps(&self, run: &mut PipelineRun, id: &str) -> Result<RenderedMeme, PipelineError> {
        run.advance(PipelineState::FetchingRecord);
        let record = bounded("get", self.call_timeout, self.repo.get_by_id(id))
            .await?
            .filter(|r| r.has_captions() && r.has_invitation())
            .ok_or_else(|| PipelineError::NotFound(NO_MEME_BY_ID.to_string()))?;

        self.render_record(run, record).await
    }

    async fn generate_steps(&self, run: &mut PipelineRun) -> Result<RenderedMeme, PipelineError> {
        run.advance(PipelineState::Authoring);
        let generated = bounded("author", self.author_timeout, self.author.author()).await?;
        if generated.captions.is_empty() {
            return Err(AuthorError::InvalidResponse("no captions".to_string()).into());
        }

        run.advance(PipelineState::Rendering);
        let image_url = self.render_image(&generated.template_id, &generated.captions).await?;

        run.advance(PipelineState::Annotating);
        let invitation_html = annotate(&generated.invitation);

        Ok(RenderedMeme {
            captions: generated.captions.into_iter().map(CaptionLine::new).collect(),
            template_id: generated.template_id,
            invitation_html,
            image_url,
            created_at: None,
        })
    }

    async fn render_record(
        &self,
        run: &mut PipelineRun,
        record: MemeRecord,
    ) -> Result<RenderedMeme, PipelineError> {
        run.advance(PipelineState::Rendering);
        let image_url = self
            .render_image(&record.template_id, &record.caption_texts())
            .await?;

        run.advance(PipelineState::Annotating);
        let invitation_html = annotate(&record.invitation_text);

        Ok(RenderedMeme {
            captions: record.captions,
            template_id: record.template_id,
            invitation_html,
            image_url,
            created_at: Some(record.created_at),
        })
    }

    async fn render_image(&self, template_id: &str, captions: &[String]) -> Result<String, PipelineError> {
        let image_url = bounded(
            "render",
            self.call_timeout,
            self.renderer.render(template_id, captions),
        )
        .await?;
        if image_url.trim().is_empty() {
            return Err(PipelineError::Render(RENDER_FAILED.to_string()));
        }
        Ok(image_url)
    }
}

/// Awaits one gateway call under `timeout`; expiry is an upstream failure.
async fn bounded<T, E>(
    step: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, PipelineError>
where
    PipelineError: From<E>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(PipelineError::from),
        Err(_) => Err(PipelineError::UpstreamUnavailable(format!(
            "{} call timed out after {:?}",
            step, timeout
        ))),
    }
}
