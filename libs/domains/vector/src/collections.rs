use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{VectorError, VectorResult};
use crate::models::{CollectionInfo, CollectionSpec};
use crate::repository::VectorRepository;

/// Idempotent collection provisioning.
///
/// `ensure_collection` may be called concurrently for the same name; exactly
/// one create wins and every caller observes the same stored shape.
pub struct CollectionManager<R: VectorRepository> {
    repository: Arc<R>,
}

impl<R: VectorRepository> Clone for CollectionManager<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: VectorRepository> CollectionManager<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Make sure `spec.name` exists with `spec`'s dimension and metric.
    ///
    /// An existing collection with a different shape is never modified; the
    /// caller gets `CollectionMismatch` instead.
    pub async fn ensure_collection(&self, spec: &CollectionSpec) -> VectorResult<CollectionInfo> {
        self.ensure_with(spec, check_shape).await
    }

    /// Like `ensure_collection`, but an existing collection only has to match
    /// `spec.vector_size`. Its stored metric and options are kept.
    pub async fn ensure_dimension(&self, spec: &CollectionSpec) -> VectorResult<CollectionInfo> {
        self.ensure_with(spec, check_dimension).await
    }

    async fn ensure_with(
        &self,
        spec: &CollectionSpec,
        check: fn(&CollectionSpec, CollectionInfo) -> VectorResult<CollectionInfo>,
    ) -> VectorResult<CollectionInfo> {
        if let Some(existing) = self.repository.get_collection(&spec.name).await? {
            return check(spec, existing);
        }

        match self.repository.create_collection(spec).await {
            Ok(()) => info!(collection = %spec.name, shape = %spec.describe_shape(), "Collection created"),
            Err(VectorError::CollectionExists(_)) => {
                debug!(collection = %spec.name, "Collection created concurrently")
            }
            Err(e) => return Err(e),
        }

        let stored = self
            .repository
            .get_collection(&spec.name)
            .await?
            .ok_or_else(|| {
                VectorError::store_unavailable(
                    "get_collection",
                    Some(&spec.name),
                    "collection missing right after creation",
                )
            })?;
        check(spec, stored)
    }

    pub async fn describe(&self, name: &str) -> VectorResult<CollectionInfo> {
        self.repository
            .get_collection(name)
            .await?
            .ok_or_else(|| VectorError::collection_not_found(name))
    }
}

fn check_shape(spec: &CollectionSpec, stored: CollectionInfo) -> VectorResult<CollectionInfo> {
    if stored.distance == spec.distance {
        check_dimension(spec, stored)
    } else {
        Err(mismatch(spec, &stored))
    }
}

fn check_dimension(spec: &CollectionSpec, stored: CollectionInfo) -> VectorResult<CollectionInfo> {
    if stored.vector_size == spec.vector_size {
        Ok(stored)
    } else {
        Err(mismatch(spec, &stored))
    }
}

fn mismatch(spec: &CollectionSpec, stored: &CollectionInfo) -> VectorError {
    VectorError::CollectionMismatch {
        name: spec.name.clone(),
        requested: spec.describe_shape(),
        actual: stored.describe_shape(),
    }
}
