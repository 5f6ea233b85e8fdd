mod rest;

use axum::{
    Router,
    routing::{get, post},
};
use axum_helpers::ErrorResponse;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{
    CollectionInfo, CollectionList, CollectionOptions, CollectionStatus, CreateCollectionRequest,
    DistanceMetric, GetPointsRequest, GetPointsResponse, PointId, PointInput, ScoredPoint,
    SearchRequest, SearchResponse, StoredPoint, UpsertRequest, UpsertResponse,
};
use crate::repository::VectorRepository;
use crate::service::VectorService;

/// OpenAPI documentation for the gateway REST API
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::health,
        rest::list_collections,
        rest::create_collection,
        rest::get_collection,
        rest::upsert_points,
        rest::search_points,
        rest::get_points,
    ),
    components(
        schemas(
            CollectionInfo, CollectionList, CollectionOptions, CollectionStatus,
            CreateCollectionRequest, DistanceMetric, PointId, PointInput,
            UpsertRequest, UpsertResponse, SearchRequest, SearchResponse, ScoredPoint,
            GetPointsRequest, GetPointsResponse, StoredPoint, ErrorResponse
        )
    ),
    tags(
        (name = "collections", description = "Collection provisioning"),
        (name = "vectors", description = "Embedding, storage and semantic search"),
        (name = "health", description = "Liveness of the store and the embedding model")
    )
)]
pub struct GatewayApiDoc;

/// REST routes over a shared service
pub fn router<R: VectorRepository + 'static>(service: Arc<VectorService<R>>) -> Router {
    Router::new()
        .route("/health", get(rest::health::<R>))
        .route(
            "/collections",
            get(rest::list_collections::<R>).post(rest::create_collection::<R>),
        )
        .route("/collections/{name}", get(rest::get_collection::<R>))
        .route("/vectors/upsert", post(rest::upsert_points::<R>))
        .route("/vectors/search", post(rest::search_points::<R>))
        .route("/vectors/get", post(rest::get_points::<R>))
        .with_state(service)
}
