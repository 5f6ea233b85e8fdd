use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, CreateCollectionBuilder, GetPointsBuilder, PointStruct, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, vectors_config,
};
use qdrant_client::{Qdrant, QdrantError};
use tracing::{debug, warn};

use super::QdrantConfig;
use super::convert::{
    from_qdrant_distance, from_qdrant_payload, restore_id, to_qdrant_distance, to_qdrant_id,
    to_qdrant_payload,
};
use crate::error::{VectorError, VectorResult};
use crate::models::{
    CollectionInfo, CollectionSpec, CollectionStatus, PointId, PointRecord, ScoredPoint,
    StoredPoint,
};
use crate::repository::VectorRepository;

// gRPC status codes returned by Qdrant
const GRPC_CANCELLED: i32 = 1;
const GRPC_INVALID_ARGUMENT: i32 = 3;
const GRPC_DEADLINE_EXCEEDED: i32 = 4;
const GRPC_NOT_FOUND: i32 = 5;
const GRPC_ALREADY_EXISTS: i32 = 6;
const GRPC_FAILED_PRECONDITION: i32 = 9;
const GRPC_UNAVAILABLE: i32 = 14;

/// Qdrant-backed implementation of VectorRepository
pub struct QdrantRepository {
    client: Qdrant,
    call_timeout: Duration,
    /// Applied to every search; Qdrant keeps no per-collection equivalent.
    indexed_only: bool,
}

impl QdrantRepository {
    pub fn connect(config: &QdrantConfig, indexed_only: bool) -> VectorResult<Self> {
        let mut builder = Qdrant::from_url(&config.url).timeout(config.timeout());

        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorError::store_unavailable("connect", None, e.to_string()))?;

        Ok(Self::from_client(client, config.timeout(), indexed_only))
    }

    pub fn from_client(client: Qdrant, call_timeout: Duration, indexed_only: bool) -> Self {
        Self {
            client,
            call_timeout,
            indexed_only,
        }
    }

    /// Run one store call under the per-call deadline.
    async fn call<T, F>(&self, operation: &str, collection: Option<&str>, fut: F) -> VectorResult<T>
    where
        F: Future<Output = Result<T, QdrantError>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify(operation, collection, err)),
            Err(_) => Err(VectorError::store_unavailable(
                operation,
                collection,
                format!("no response within {:?}", self.call_timeout),
            )),
        }
    }
}

/// Map a client error onto the gateway's error kinds.
fn classify(operation: &str, collection: Option<&str>, err: QdrantError) -> VectorError {
    let QdrantError::ResponseError { status } = &err else {
        return VectorError::store_unavailable(operation, collection, err.to_string());
    };

    let message = status.message().to_string();
    match status.code() as i32 {
        GRPC_ALREADY_EXISTS => VectorError::CollectionExists(collection.unwrap_or_default().to_string()),
        GRPC_INVALID_ARGUMENT if message.contains("already exists") => {
            VectorError::CollectionExists(collection.unwrap_or_default().to_string())
        }
        GRPC_NOT_FOUND => match collection {
            Some(name) => VectorError::collection_not_found(name),
            None => VectorError::NotFound(message),
        },
        GRPC_INVALID_ARGUMENT | GRPC_FAILED_PRECONDITION => {
            VectorError::store_rejected(operation, collection, message)
        }
        GRPC_UNAVAILABLE | GRPC_DEADLINE_EXCEEDED | GRPC_CANCELLED => {
            VectorError::store_unavailable(operation, collection, message)
        }
        _ => VectorError::store_unavailable(operation, collection, err.to_string()),
    }
}

fn map_status(status: qdrant::CollectionStatus) -> CollectionStatus {
    match status {
        qdrant::CollectionStatus::Green => CollectionStatus::Green,
        qdrant::CollectionStatus::Yellow => CollectionStatus::Yellow,
        qdrant::CollectionStatus::Red => CollectionStatus::Red,
        _ => CollectionStatus::Grey,
    }
}

#[async_trait]
impl VectorRepository for QdrantRepository {
    async fn create_collection(&self, spec: &CollectionSpec) -> VectorResult<()> {
        let builder = CreateCollectionBuilder::new(&spec.name)
            .vectors_config(VectorParamsBuilder::new(
                spec.vector_size,
                to_qdrant_distance(spec.distance),
            ))
            .on_disk_payload(spec.options.on_disk_payload);

        self.call(
            "create_collection",
            Some(&spec.name),
            self.client.create_collection(builder),
        )
        .await?;

        debug!(collection = %spec.name, shape = %spec.describe_shape(), "Created collection");
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.call(
            "collection_exists",
            Some(name),
            self.client.collection_exists(name),
        )
        .await
    }

    async fn get_collection(&self, name: &str) -> VectorResult<Option<CollectionInfo>> {
        let response = match self
            .call("get_collection", Some(name), self.client.collection_info(name))
            .await
        {
            Ok(response) => response,
            Err(VectorError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };

        let Some(info) = response.result else {
            return Ok(None);
        };

        let params = info.config.as_ref().and_then(|c| c.params.as_ref());
        let vector_params = match params
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| v.config.as_ref())
        {
            Some(vectors_config::Config::Params(p)) => p,
            Some(vectors_config::Config::ParamsMap(_)) => {
                return Err(VectorError::Internal(format!(
                    "collection '{}' uses named vectors",
                    name
                )));
            }
            None => {
                return Err(VectorError::Internal(format!(
                    "collection '{}' has no vector parameters",
                    name
                )));
            }
        };

        let distance = from_qdrant_distance(vector_params.distance()).ok_or_else(|| {
            VectorError::Internal(format!(
                "collection '{}' uses an unsupported distance",
                name
            ))
        })?;

        Ok(Some(CollectionInfo {
            name: name.to_string(),
            vector_size: vector_params.size,
            distance,
            on_disk_payload: params.map(|p| p.on_disk_payload).unwrap_or_default(),
            indexed_only: self.indexed_only,
            points_count: info.points_count.unwrap_or_default(),
            status: map_status(info.status()),
        }))
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let response = self
            .call("list_collections", None, self.client.list_collections())
            .await?;

        let mut names: Vec<String> = response
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> VectorResult<usize> {
        let count = points.len();
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let id = to_qdrant_id(&point.id);
                let payload = to_qdrant_payload(&point.id, point.payload);
                PointStruct::new(id, point.vector, payload)
            })
            .collect();

        let builder = UpsertPointsBuilder::new(collection, points).wait(true);
        self.call("upsert", Some(collection), self.client.upsert_points(builder))
            .await?;

        Ok(count)
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        score_threshold: Option<f32>,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let mut builder = SearchPointsBuilder::new(collection, vector, limit)
            .with_payload(true)
            .params(SearchParamsBuilder::default().indexed_only(self.indexed_only));

        if let Some(threshold) = score_threshold {
            builder = builder.score_threshold(threshold);
        }

        let response = self
            .call("search", Some(collection), self.client.search_points(builder))
            .await?;

        let mut results = Vec::with_capacity(response.result.len());
        for point in response.result {
            let mut payload = from_qdrant_payload(point.payload);
            let Some(id) = restore_id(point.id.as_ref(), &mut payload) else {
                warn!(collection, "Search hit without an id, skipping");
                continue;
            };
            results.push(ScoredPoint {
                id,
                score: point.score,
                payload,
            });
        }
        Ok(results)
    }

    async fn get_points(&self, collection: &str, ids: &[PointId]) -> VectorResult<Vec<StoredPoint>> {
        let wire_ids = ids.iter().map(to_qdrant_id).collect::<Vec<_>>();
        let builder = GetPointsBuilder::new(collection, wire_ids).with_payload(true);

        let response = self
            .call("get_points", Some(collection), self.client.get_points(builder))
            .await?;

        let mut points = Vec::with_capacity(response.result.len());
        for point in response.result {
            let mut payload = from_qdrant_payload(point.payload);
            if let Some(id) = restore_id(point.id.as_ref(), &mut payload) {
                points.push(StoredPoint { id, payload });
            }
        }
        Ok(points)
    }

    async fn health(&self) -> VectorResult<()> {
        self.call("health", None, self.client.health_check())
            .await
            .map(|_| ())
    }
}
