//! In-process repository with Qdrant's observable semantics.
//!
//! Used by tests and local tooling. Availability can be toggled to exercise
//! the store-unavailable paths without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionInfo, CollectionSpec, CollectionStatus, DistanceMetric, Payload, PointId,
    PointRecord, ScoredPoint, StoredPoint,
};
use crate::repository::VectorRepository;

struct StoredCollection {
    spec: CollectionSpec,
    points: Vec<(PointId, Vec<f32>, Payload)>,
}

pub struct InMemoryRepository {
    collections: RwLock<HashMap<String, StoredCollection>>,
    available: AtomicBool,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.points.len())
    }

    fn ensure_available(&self, operation: &str, collection: Option<&str>) -> VectorResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(VectorError::store_unavailable(
                operation,
                collection,
                "connection refused",
            ))
        }
    }
}

fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match metric {
        DistanceMetric::Dot => dot,
        DistanceMetric::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

#[async_trait]
impl VectorRepository for InMemoryRepository {
    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()> {
        self.ensure_available("create_collection", Some(&spec.name))?;
        let mut collections = self.collections.write().await;
        if collections.contains_key(&spec.name) {
            return Err(VectorError::CollectionExists(spec.name.clone()));
        }
        collections.insert(
            spec.name.clone(),
            StoredCollection {
                spec: spec.clone(),
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.ensure_available("collection_exists", Some(name))?;
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn get_collection(&self, name: &str) -> VectorResult<Option<CollectionInfo>> {
        self.ensure_available("get_collection", Some(name))?;
        Ok(self.collections.read().await.get(name).map(|c| CollectionInfo {
            name: c.spec.name.clone(),
            vector_size: c.spec.vector_size,
            distance: c.spec.distance,
            on_disk_payload: c.spec.options.on_disk_payload,
            indexed_only: false,
            points_count: c.points.len() as u64,
            status: CollectionStatus::Green,
        }))
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        self.ensure_available("list_collections", None)?;
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> VectorResult<usize> {
        self.ensure_available("upsert", Some(collection))?;
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;

        let expected = stored.spec.vector_size as usize;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != expected) {
            return Err(VectorError::store_rejected(
                "upsert",
                Some(collection),
                format!(
                    "point {} has dimension {}, expected {}",
                    bad.id,
                    bad.vector.len(),
                    expected
                ),
            ));
        }

        let count = points.len();
        for point in points {
            stored.points.retain(|(id, _, _)| *id != point.id);
            stored.points.push((point.id, point.vector, point.payload));
        }
        Ok(count)
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: Option<f32>,
    ) -> VectorResult<Vec<ScoredPoint>> {
        self.ensure_available("search", Some(collection))?;
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;

        if vector.len() != stored.spec.vector_size as usize {
            return Err(VectorError::store_rejected(
                "search",
                Some(collection),
                format!(
                    "query has dimension {}, expected {}",
                    vector.len(),
                    stored.spec.vector_size
                ),
            ));
        }

        let metric = stored.spec.distance;
        let distance_like = metric == DistanceMetric::Euclidean;
        let mut hits: Vec<ScoredPoint> = stored
            .points
            .iter()
            .map(|(id, values, payload)| ScoredPoint {
                id: id.clone(),
                score: score(metric, &vector, values),
                payload: payload.clone(),
            })
            .filter(|hit| match score_threshold {
                None => true,
                Some(t) if distance_like => hit.score <= t,
                Some(t) => hit.score >= t,
            })
            .collect();

        if distance_like {
            hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        } else {
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn get_points(&self, collection: &str, ids: &[PointId]) -> VectorResult<Vec<StoredPoint>> {
        self.ensure_available("get_points", Some(collection))?;
        let collections = self.collections.read().await;
        let stored = collections
            .get(collection)
            .ok_or_else(|| VectorError::collection_not_found(collection))?;

        Ok(ids
            .iter()
            .filter_map(|wanted| {
                stored
                    .points
                    .iter()
                    .find(|(id, _, _)| id == wanted)
                    .map(|(id, _, payload)| StoredPoint {
                        id: id.clone(),
                        payload: payload.clone(),
                    })
            })
            .collect())
    }

    async fn health(&self) -> VectorResult<()> {
        self.ensure_available("health", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectionOptions;

    fn spec(name: &str, distance: DistanceMetric) -> CollectionSpec {
        CollectionSpec {
            name: name.to_string(),
            vector_size: 2,
            distance,
            options: CollectionOptions::default(),
        }
    }

    fn point(id: &str, vector: [f32; 2]) -> PointRecord {
        PointRecord {
            id: PointId::from(id),
            vector: vector.to_vec(),
            payload: Payload::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_reports_exists() {
        let repo = InMemoryRepository::new();
        repo.create_collection(&spec("c", DistanceMetric::Cosine)).await.unwrap();
        let err = repo
            .create_collection(&spec("c", DistanceMetric::Cosine))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::CollectionExists(_)));
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.create_collection(&spec("c", DistanceMetric::Cosine)).await.unwrap();
        let bad = PointRecord {
            id: PointId::from("x"),
            vector: vec![1.0, 0.0, 0.0],
            payload: Payload::new(),
        };
        let err = repo.upsert("c", vec![bad]).await.unwrap_err();
        assert!(matches!(err, VectorError::StoreRejected { .. }));
        assert_eq!(repo.point_count("c").await, 0);
    }

    #[tokio::test]
    async fn test_euclidean_orders_by_ascending_distance() {
        let repo = InMemoryRepository::new();
        repo.create_collection(&spec("e", DistanceMetric::Euclidean)).await.unwrap();
        repo.upsert("e", vec![point("far", [5.0, 5.0]), point("near", [1.0, 0.0])])
            .await
            .unwrap();

        let hits = repo.search("e", vec![1.0, 0.1], 10, None).await.unwrap();
        assert_eq!(hits[0].id, PointId::from("near"));
        assert!(hits[0].score < hits[1].score);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let repo = InMemoryRepository::new();
        repo.set_available(false);
        let err = repo.list_collections().await.unwrap_err();
        assert!(err.kind().is_retryable());
        assert!(repo.health().await.is_err());

        repo.set_available(true);
        assert!(repo.health().await.is_ok());
    }
}
