use async_trait::async_trait;

use crate::error::VectorResult;
use crate::models::{CollectionInfo, CollectionSpec, PointId, PointRecord, ScoredPoint, StoredPoint};

/// Storage port for vectors and their payloads.
///
/// Implementations classify failures: transport problems and timeouts become
/// `StoreUnavailable`, requests the store refused become `StoreRejected`, and
/// a create that loses a race reports `CollectionExists`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    // ===== Collection Management =====

    /// Create a collection. Fails with `CollectionExists` if the name is taken.
    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()>;

    async fn collection_exists(&self, name: &str) -> VectorResult<bool>;

    /// Stored shape and counters, or `None` if the collection does not exist.
    async fn get_collection(&self, name: &str) -> VectorResult<Option<CollectionInfo>>;

    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    // ===== Point Operations =====

    /// Insert or replace points. Returns once the write is durable.
    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> VectorResult<usize>;

    /// Nearest neighbours of `vector`, best first, in the store's native score.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: Option<f32>,
    ) -> VectorResult<Vec<ScoredPoint>>;

    /// Points by id. Unknown ids are skipped.
    async fn get_points(&self, collection: &str, ids: &[PointId]) -> VectorResult<Vec<StoredPoint>>;

    async fn health(&self) -> VectorResult<()>;
}
