use std::sync::Arc;

use axum_helpers::HealthCheckFuture;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use validator::Validate;

use crate::collections::CollectionManager;
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionInfo, CollectionList, CollectionOptions, CollectionSpec, CreateCollectionRequest,
    DistanceMetric, GetPointsRequest, GetPointsResponse, PointId, PointRecord, ScoredPoint,
    SearchRequest, SearchResponse, UpsertRequest, UpsertResponse,
};
use crate::qdrant::convert::GATEWAY_ID_KEY;
use crate::repository::VectorRepository;
use crate::settings::VectorSettings;

/// Payload keys the gateway fills in for content-bearing points.
pub const CONTENT_KEY: &str = "content";
pub const TOKENS_KEY: &str = "tokens";

/// Transport-independent gateway operations.
///
/// Both the REST API and the MCP server call into one shared instance. The
/// embedder and repository are loaded once and never swapped.
pub struct VectorService<R: VectorRepository> {
    repository: Arc<R>,
    embedder: Arc<dyn EmbeddingProvider>,
    collections: CollectionManager<R>,
    settings: VectorSettings,
}

impl<R: VectorRepository + 'static> VectorService<R> {
    pub fn new(
        repository: Arc<R>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: VectorSettings,
    ) -> Self {
        Self {
            collections: CollectionManager::new(Arc::clone(&repository)),
            repository,
            embedder,
            settings,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn settings(&self) -> &VectorSettings {
        &self.settings
    }

    pub fn default_collection(&self) -> &str {
        &self.settings.collection_name
    }

    /// Create the default collection if needed, sized for the loaded embedder.
    pub async fn ensure_default_collection(&self) -> VectorResult<CollectionInfo> {
        let spec = self
            .settings
            .default_spec(&self.settings.collection_name, self.embedder.dimension() as u64);
        self.collections.ensure_collection(&spec).await
    }

    /// Probes for the vector store and the embedding model.
    pub fn health_checks(&self) -> Vec<(&'static str, HealthCheckFuture<'_>)> {
        let store: HealthCheckFuture<'_> = Box::pin(async move {
            self.repository
                .health()
                .await
                .map(|()| Value::Null)
                .map_err(|e| e.to_string())
        });
        let embedding: HealthCheckFuture<'_> = Box::pin(async move {
            self.embedder
                .health()
                .await
                .map(|()| {
                    json!({
                        "model": self.embedder.model_name(),
                        "dimension": self.embedder.dimension(),
                    })
                })
                .map_err(|e| e.to_string())
        });
        vec![("vector_store", store), ("embedding", embedding)]
    }

    // ===== Collection Management =====

    #[instrument(skip(self, request), fields(collection = %request.name))]
    pub async fn create_collection(
        &self,
        request: CreateCollectionRequest,
    ) -> VectorResult<CollectionInfo> {
        request.validate()?;
        if request.vector_size > self.settings.max_vector_size {
            return Err(VectorError::InvalidRequest(format!(
                "vector_size {} exceeds the maximum of {}",
                request.vector_size, self.settings.max_vector_size
            )));
        }

        let defaults = self.settings.collection_options();
        let spec = CollectionSpec {
            name: request.name,
            vector_size: request.vector_size,
            distance: request.distance,
            options: CollectionOptions {
                on_disk_payload: request.on_disk_payload.unwrap_or(defaults.on_disk_payload),
            },
        };
        self.collections.ensure_collection(&spec).await
    }

    pub async fn get_collection(&self, name: &str) -> VectorResult<CollectionInfo> {
        self.collections.describe(name).await
    }

    pub async fn list_collections(&self) -> VectorResult<CollectionList> {
        Ok(CollectionList {
            collections: self.repository.list_collections().await?,
        })
    }

    // ===== Point Operations =====

    /// Embed and store a batch. Either every point is written or none is.
    #[instrument(skip(self, request), fields(points = request.points.len()))]
    pub async fn upsert(&self, request: UpsertRequest) -> VectorResult<UpsertResponse> {
        request.validate()?;
        let collection = request
            .collection
            .unwrap_or_else(|| self.settings.collection_name.clone());

        if request.points.is_empty() {
            return Err(VectorError::InvalidRequest(
                "points must not be empty".to_string(),
            ));
        }
        if request.points.len() > self.settings.max_batch_points {
            return Err(VectorError::BatchTooLarge {
                size: request.points.len(),
                max: self.settings.max_batch_points,
            });
        }

        let dimension = self.embedder.dimension();
        let mut texts = Vec::new();
        for (index, point) in request.points.iter().enumerate() {
            if point.payload.contains_key(GATEWAY_ID_KEY) {
                return Err(VectorError::InvalidRequest(format!(
                    "point {} uses the reserved payload key {}",
                    index, GATEWAY_ID_KEY
                )));
            }
            match (&point.content, &point.vector) {
                (Some(_), Some(_)) | (None, None) => {
                    return Err(VectorError::InvalidRequest(format!(
                        "point {} must carry exactly one of content or vector",
                        index
                    )));
                }
                (Some(content), None) => {
                    if content.trim().is_empty() {
                        return Err(VectorError::InvalidRequest(format!(
                            "point {} has empty content",
                            index
                        )));
                    }
                    texts.push(content.clone());
                }
                (None, Some(vector)) => {
                    if vector.len() != dimension {
                        return Err(VectorError::InvalidRequest(format!(
                            "point {} has dimension {}, expected {}",
                            index,
                            vector.len(),
                            dimension
                        )));
                    }
                    if vector.iter().any(|v| !v.is_finite()) {
                        return Err(VectorError::InvalidRequest(format!(
                            "point {} has a non-finite component",
                            index
                        )));
                    }
                }
            }
        }

        let mut embeddings = self
            .embedder
            .embed_batch(&texts, self.settings.max_tokens)
            .await?
            .into_iter();

        // An existing collection keeps its metric; only the dimension has to fit.
        self.collections
            .ensure_dimension(&self.settings.default_spec(&collection, dimension as u64))
            .await?;

        let mut records = Vec::with_capacity(request.points.len());
        for point in request.points {
            let id = point.id.unwrap_or_else(PointId::generate);
            let mut payload = point.payload;
            let vector = match point.vector {
                Some(vector) => vector,
                None => {
                    let embedding = embeddings.next().ok_or_else(|| {
                        VectorError::Embedding("fewer embeddings than texts".to_string())
                    })?;
                    if embedding.truncated {
                        debug!(%id, tokens = embedding.tokens, "Content truncated for embedding");
                    }
                    let content = point.content.unwrap_or_default();
                    payload
                        .entry(CONTENT_KEY)
                        .or_insert_with(|| Value::String(content));
                    payload
                        .entry(TOKENS_KEY)
                        .or_insert_with(|| json!(embedding.tokens));
                    embedding.values
                }
            };
            records.push(PointRecord {
                id,
                vector,
                payload,
            });
        }

        let acknowledged: Vec<PointId> = records.iter().map(|r| r.id.clone()).collect();

        // Detached so a dropped request cannot cancel a write halfway.
        let repository = Arc::clone(&self.repository);
        let target = collection.clone();
        tokio::spawn(async move { repository.upsert(&target, records).await })
            .await
            .map_err(|e| VectorError::Internal(format!("upsert task failed: {}", e)))??;

        debug!(collection = %collection, count = acknowledged.len(), "Upserted points");
        Ok(UpsertResponse {
            collection,
            acknowledged,
        })
    }

    /// Semantic search over a collection, best match first.
    #[instrument(skip(self, request))]
    pub async fn search(&self, request: SearchRequest) -> VectorResult<SearchResponse> {
        request.validate()?;
        if request.query.trim().is_empty() {
            return Err(VectorError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }

        let limit = request.limit.unwrap_or(self.settings.top_k);
        if limit == 0 || limit > self.settings.max_search_limit {
            return Err(VectorError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                self.settings.max_search_limit
            )));
        }

        let threshold = request.score_threshold.unwrap_or(self.settings.min_score);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(VectorError::InvalidRequest(
                "score_threshold must be between 0 and 1".to_string(),
            ));
        }

        let collection = request
            .collection
            .unwrap_or_else(|| self.settings.collection_name.clone());
        let info = self.collections.describe(&collection).await?;

        let embedding = self
            .embedder
            .embed(&request.query, self.settings.max_tokens)
            .await?;

        let store_threshold = match info.distance {
            DistanceMetric::Euclidean => None,
            DistanceMetric::Cosine | DistanceMetric::Dot => Some(threshold),
        };

        let hits = self
            .repository
            .search(&collection, embedding.values, limit, store_threshold)
            .await?;

        let results = rank(hits, info.distance, threshold, limit as usize);
        Ok(SearchResponse {
            query: request.query,
            collection,
            total: results.len(),
            results,
        })
    }

    /// Stored payloads by id. Unknown ids are omitted.
    pub async fn get_points(&self, request: GetPointsRequest) -> VectorResult<GetPointsResponse> {
        request.validate()?;
        if request.ids.len() > self.settings.max_batch_points {
            return Err(VectorError::BatchTooLarge {
                size: request.ids.len(),
                max: self.settings.max_batch_points,
            });
        }

        let collection = request
            .collection
            .unwrap_or_else(|| self.settings.collection_name.clone());
        self.collections.describe(&collection).await?;

        let points = self.repository.get_points(&collection, &request.ids).await?;
        Ok(GetPointsResponse { collection, points })
    }
}

/// Normalise store scores to "higher is better", then filter, order and cap.
///
/// Euclidean distances map to `1 / (1 + d)`.
fn rank(
    hits: Vec<ScoredPoint>,
    distance: DistanceMetric,
    threshold: f32,
    limit: usize,
) -> Vec<ScoredPoint> {
    let mut results: Vec<ScoredPoint> = hits
        .into_iter()
        .map(|mut hit| {
            if distance == DistanceMetric::Euclidean {
                hit.score = 1.0 / (1.0 + hit.score.max(0.0));
            }
            hit
        })
        .filter(|hit| hit.score >= threshold)
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingProvider;
    use crate::memory::InMemoryRepository;
    use crate::models::{CollectionStatus, Payload, PointInput};
    use crate::repository::MockVectorRepository;

    fn service(mock: MockVectorRepository) -> VectorService<MockVectorRepository> {
        VectorService::new(
            Arc::new(mock),
            Arc::new(HashingProvider::new(384).unwrap()),
            VectorSettings {
                max_batch_points: 2,
                ..Default::default()
            },
        )
    }

    fn memory_service() -> VectorService<InMemoryRepository> {
        VectorService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(HashingProvider::new(384).unwrap()),
            VectorSettings::default(),
        )
    }

    fn info(distance: DistanceMetric) -> CollectionInfo {
        CollectionInfo {
            name: "claude_vectors".to_string(),
            vector_size: 384,
            distance,
            on_disk_payload: false,
            indexed_only: false,
            points_count: 3,
            status: CollectionStatus::Green,
        }
    }

    fn text_point(content: &str) -> PointInput {
        PointInput {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn hit(id: &str, score: f32) -> ScoredPoint {
        ScoredPoint {
            id: PointId::from(id),
            score,
            payload: Payload::new(),
        }
    }

    #[tokio::test]
    async fn test_oversized_batch_touches_nothing() {
        // No expectations: any repository call would panic.
        let service = service(MockVectorRepository::new());
        let err = service
            .upsert(UpsertRequest {
                collection: None,
                points: vec![text_point("a"), text_point("b"), text_point("c")],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::BatchTooLarge { size: 3, max: 2 }));
    }

    #[tokio::test]
    async fn test_point_needs_exactly_one_source() {
        let service = service(MockVectorRepository::new());
        let both = PointInput {
            content: Some("x".to_string()),
            vector: Some(vec![0.0; 384]),
            ..Default::default()
        };
        let err = service
            .upsert(UpsertRequest {
                collection: None,
                points: vec![both],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidRequest(_)));

        let err = service
            .upsert(UpsertRequest {
                collection: None,
                points: vec![PointInput::default()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_reserved_payload_key_is_rejected() {
        let service = service(MockVectorRepository::new());
        let mut payload = Payload::new();
        payload.insert(GATEWAY_ID_KEY.to_string(), json!("someone-else"));
        let err = service
            .upsert(UpsertRequest {
                collection: None,
                points: vec![PointInput {
                    id: Some(PointId::Num(7)),
                    content: Some("hello".to_string()),
                    vector: None,
                    payload,
                }],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_upsert_fills_content_and_tokens() {
        let mut mock = MockVectorRepository::new();
        mock.expect_get_collection()
            .returning(|_| Ok(Some(info(DistanceMetric::Cosine))));
        mock.expect_upsert()
            .withf(|collection, points| {
                collection == "claude_vectors"
                    && points.len() == 1
                    && points[0].id == PointId::from("a1")
                    && points[0].payload["content"] == "hello world"
                    && points[0].payload["tokens"] == 2
                    && points[0].payload["source"] == "test"
            })
            .times(1)
            .returning(|_, points| Ok(points.len()));

        let mut payload = Payload::new();
        payload.insert("source".to_string(), json!("test"));
        let response = service(mock)
            .upsert(UpsertRequest {
                collection: None,
                points: vec![PointInput {
                    id: Some(PointId::from("a1")),
                    content: Some("hello world".to_string()),
                    vector: None,
                    payload,
                }],
            })
            .await
            .unwrap();

        assert_eq!(response.acknowledged, vec![PointId::from("a1")]);
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_as_retryable() {
        let mut mock = MockVectorRepository::new();
        mock.expect_get_collection()
            .returning(|_| Ok(Some(info(DistanceMetric::Cosine))));
        mock.expect_search().returning(|collection, _, _, _| {
            Err(VectorError::store_unavailable(
                "search",
                Some(collection),
                "connection refused",
            ))
        });

        let err = service(mock)
            .search(SearchRequest {
                query: "hello".to_string(),
                collection: None,
                limit: None,
                score_threshold: None,
            })
            .await
            .unwrap_err();
        assert!(err.kind().is_retryable());
    }

    #[tokio::test]
    async fn test_search_defaults_and_bounds() {
        let mut mock = MockVectorRepository::new();
        mock.expect_get_collection()
            .returning(|_| Ok(Some(info(DistanceMetric::Cosine))));
        mock.expect_search()
            .withf(|_, vector, limit, threshold| {
                vector.len() == 384 && *limit == 10 && *threshold == Some(0.22)
            })
            .times(1)
            .returning(|_, _, _, _| Ok(vec![hit("low", 0.3), hit("high", 0.9)]));

        let service = service(mock);
        let response = service
            .search(SearchRequest {
                query: "hello".to_string(),
                collection: None,
                limit: None,
                score_threshold: None,
            })
            .await
            .unwrap();
        assert_eq!(response.total, 2);
        assert_eq!(response.results[0].id, PointId::from("high"));

        for (limit, threshold) in [(Some(0), None), (Some(101), None), (None, Some(1.5))] {
            let err = service
                .search(SearchRequest {
                    query: "hello".to_string(),
                    collection: None,
                    limit,
                    score_threshold: threshold,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, VectorError::InvalidRequest(_)));
        }
    }

    #[test]
    fn test_euclidean_scores_are_inverted() {
        let ranked = rank(
            vec![hit("far", 3.0), hit("near", 0.25)],
            DistanceMetric::Euclidean,
            0.22,
            10,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, PointId::from("near"));
        assert!((ranked[0].score - 0.8).abs() < 1e-6);
        assert!((ranked[1].score - 0.25).abs() < 1e-6);

        let ranked = rank(vec![hit("far", 9.0)], DistanceMetric::Euclidean, 0.22, 10);
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_missing_collection_is_not_found() {
        let mut mock = MockVectorRepository::new();
        mock.expect_get_collection().returning(|_| Ok(None));
        let err = service(mock)
            .get_points(GetPointsRequest {
                collection: Some("nope".to_string()),
                ids: vec![PointId::from("a")],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_into_collection_with_non_default_metric() {
        let service = memory_service();
        for distance in [DistanceMetric::Euclidean, DistanceMetric::Dot] {
            let name = format!("geo_{}", distance);
            service
                .create_collection(CreateCollectionRequest {
                    name: name.clone(),
                    vector_size: 384,
                    distance,
                    on_disk_payload: None,
                })
                .await
                .unwrap();

            let response = service
                .upsert(UpsertRequest {
                    collection: Some(name.clone()),
                    points: vec![text_point("hello world")],
                })
                .await
                .unwrap();
            assert_eq!(response.acknowledged.len(), 1);

            let stored = service.get_collection(&name).await.unwrap();
            assert_eq!(stored.distance, distance);
            assert_eq!(stored.points_count, 1);
        }

        let found = service
            .search(SearchRequest {
                query: "hello world".to_string(),
                collection: Some("geo_euclidean".to_string()),
                limit: Some(1),
                score_threshold: Some(0.0),
            })
            .await
            .unwrap();
        assert_eq!(found.total, 1);
        assert!(found.results[0].score > 0.0 && found.results[0].score <= 1.0);
    }

    #[tokio::test]
    async fn test_search_results_respect_limit_and_threshold() {
        let service = memory_service();
        let texts = [
            "deploy the staging cluster",
            "staging cluster credentials rotate weekly",
            "lunch menu for friday",
            "rotate the production credentials",
            "cluster upgrade notes for staging",
            "weekly planning meeting",
        ];
        service
            .upsert(UpsertRequest {
                collection: None,
                points: texts.iter().map(|t| text_point(t)).collect(),
            })
            .await
            .unwrap();

        for limit in [1u64, 2, 4, 10] {
            for threshold in [0.0f32, 0.1, 0.3, 0.6] {
                let found = service
                    .search(SearchRequest {
                        query: "staging cluster credentials".to_string(),
                        collection: None,
                        limit: Some(limit),
                        score_threshold: Some(threshold),
                    })
                    .await
                    .unwrap();

                assert!(found.results.len() as u64 <= limit);
                assert_eq!(found.total, found.results.len());
                assert!(found.results.iter().all(|r| r.score >= threshold));
                assert!(
                    found
                        .results
                        .windows(2)
                        .all(|pair| pair[0].score >= pair[1].score)
                );
            }
        }

        let all = service
            .search(SearchRequest {
                query: "staging cluster credentials".to_string(),
                collection: None,
                limit: Some(10),
                score_threshold: Some(0.0),
            })
            .await
            .unwrap();
        assert!(all.total >= 3 && all.total <= texts.len());
    }
}
