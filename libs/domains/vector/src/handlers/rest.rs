use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_helpers::{ErrorResponse, ValidatedJson, run_health_checks};
use std::sync::Arc;

use crate::error::VectorResult;
use crate::models::{
    CollectionInfo, CollectionList, CreateCollectionRequest, GetPointsRequest, GetPointsResponse,
    SearchRequest, SearchResponse, UpsertRequest, UpsertResponse,
};
use crate::repository::VectorRepository;
use crate::service::VectorService;

type SharedService<R> = State<Arc<VectorService<R>>>;

/// Store and embedding model status
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "All subsystems healthy"),
        (status = 503, description = "At least one subsystem is down")
    )
)]
pub async fn health<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
) -> impl IntoResponse {
    run_health_checks(service.health_checks()).await
}

/// List collection names
#[utoipa::path(
    get,
    path = "/collections",
    tag = "collections",
    responses(
        (status = 200, description = "Collection names", body = CollectionList),
        (status = 502, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_collections<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
) -> VectorResult<Json<CollectionList>> {
    Ok(Json(service.list_collections().await?))
}

/// Create a collection, or confirm an identical one exists
#[utoipa::path(
    post,
    path = "/collections",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 200, description = "Collection exists with the requested shape", body = CollectionInfo),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Collection exists with another shape", body = ErrorResponse),
        (status = 502, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn create_collection<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
    ValidatedJson(request): ValidatedJson<CreateCollectionRequest>,
) -> VectorResult<Json<CollectionInfo>> {
    Ok(Json(service.create_collection(request).await?))
}

/// Describe one collection
#[utoipa::path(
    get,
    path = "/collections/{name}",
    tag = "collections",
    params(("name" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Collection description", body = CollectionInfo),
        (status = 404, description = "No such collection", body = ErrorResponse)
    )
)]
pub async fn get_collection<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
    Path(name): Path<String>,
) -> VectorResult<Json<CollectionInfo>> {
    Ok(Json(service.get_collection(&name).await?))
}

/// Embed and store points
#[utoipa::path(
    post,
    path = "/vectors/upsert",
    tag = "vectors",
    request_body = UpsertRequest,
    responses(
        (status = 200, description = "Every point was stored", body = UpsertResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Collection shape mismatch", body = ErrorResponse),
        (status = 413, description = "Batch too large", body = ErrorResponse),
        (status = 502, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn upsert_points<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
    ValidatedJson(request): ValidatedJson<UpsertRequest>,
) -> VectorResult<Json<UpsertResponse>> {
    Ok(Json(service.upsert(request).await?))
}

/// Semantic search
#[utoipa::path(
    post,
    path = "/vectors/search",
    tag = "vectors",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matches, best first", body = SearchResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "No such collection", body = ErrorResponse),
        (status = 502, description = "Vector store unavailable", body = ErrorResponse)
    )
)]
pub async fn search_points<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> VectorResult<Json<SearchResponse>> {
    Ok(Json(service.search(request).await?))
}

/// Fetch stored points by id
#[utoipa::path(
    post,
    path = "/vectors/get",
    tag = "vectors",
    request_body = GetPointsRequest,
    responses(
        (status = 200, description = "Points found; unknown ids are omitted", body = GetPointsResponse),
        (status = 404, description = "No such collection", body = ErrorResponse)
    )
)]
pub async fn get_points<R: VectorRepository + 'static>(
    State(service): SharedService<R>,
    ValidatedJson(request): ValidatedJson<GetPointsRequest>,
) -> VectorResult<Json<GetPointsResponse>> {
    Ok(Json(service.get_points(request).await?))
}
