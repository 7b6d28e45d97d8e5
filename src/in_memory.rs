use crate::{
    domain::{MemeRepository, RANDOM_INDEX_FIELD},
    errors::RepoError,
    models::MemeRecord,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed set of records held in memory. Counts calls so tests can assert how
/// many store round-trips a pipeline run made.
#[derive(Debug, Default)]
pub struct InMemoryMemeRepository {
    records: Vec<MemeRecord>,
    count_calls: AtomicUsize,
    query_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl InMemoryMemeRepository {
    pub fn new(records: Vec<MemeRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::Relaxed)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::Relaxed)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MemeRepository for InMemoryMemeRepository {
    async fn count(&self) -> Result<u64, RepoError> {
        self.count_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.len() as u64)
    }

    async fn query_by_field(
        &self,
        field: &str,
        value: u64,
        limit: usize,
    ) -> Result<Vec<MemeRecord>, RepoError> {
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        if field != RANDOM_INDEX_FIELD {
            return Err(RepoError::BackendError(anyhow::anyhow!(
                "in-memory store cannot query by field '{}'",
                field
            )));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.random_index == value)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<MemeRecord>, RepoError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }
}
