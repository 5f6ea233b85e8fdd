use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// Arbitrary JSON object stored alongside a vector.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Similarity metric, fixed when a collection is created.
///
/// Accepted case-insensitively; `euclid`, `dot_product` and `dotproduct` are
/// accepted as aliases.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    #[strum(to_string = "euclidean", serialize = "euclid")]
    Euclidean,
    #[strum(to_string = "dot", serialize = "dot_product", serialize = "dotproduct")]
    Dot,
}

impl<'de> Deserialize<'de> for DistanceMetric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DistanceMetric::from_str(raw.trim()).map_err(|_| {
            serde::de::Error::custom(format!(
                "unknown distance '{}', expected cosine, euclidean or dot",
                raw
            ))
        })
    }
}

/// Collection flags that do not affect vector compatibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionOptions {
    /// Keep payloads on disk instead of in RAM.
    pub on_disk_payload: bool,
}

/// What a caller expects a collection to look like.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    pub vector_size: u64,
    pub distance: DistanceMetric,
    pub options: CollectionOptions,
}

impl CollectionSpec {
    pub fn describe_shape(&self) -> String {
        format!("{} dims/{}", self.vector_size, self.distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Green,
    Yellow,
    Red,
    Grey,
}

/// Collection description returned by every collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionInfo {
    pub name: String,
    pub vector_size: u64,
    pub distance: DistanceMetric,
    pub on_disk_payload: bool,
    /// Whether searches skip unindexed segments. A gateway-wide search
    /// setting, not something Qdrant stores with the collection.
    pub indexed_only: bool,
    pub points_count: u64,
    pub status: CollectionStatus,
}

impl CollectionInfo {
    pub fn describe_shape(&self) -> String {
        format!("{} dims/{}", self.vector_size, self.distance)
    }
}

/// Caller-visible point identifier: an unsigned integer or any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Text(String),
}

impl PointId {
    pub fn generate() -> Self {
        PointId::Text(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        PointId::Num(n)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        PointId::Text(s.to_string())
    }
}

impl From<String> for PointId {
    fn from(s: String) -> Self {
        PointId::Text(s)
    }
}

/// A point ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[schema(value_type = Object)]
    pub payload: Payload,
}

/// A point read back by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredPoint {
    pub id: PointId,
    #[schema(value_type = Object)]
    pub payload: Payload,
}

/// Output of one embedding call.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    /// Token count of the input before truncation.
    pub tokens: usize,
    /// Whether the input was cut to `max_tokens` before encoding.
    pub truncated: bool,
}

fn validate_collection_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().is_empty() || name.contains('/') || name.chars().any(char::is_control) {
        return Err(validator::ValidationError::new("invalid_collection_name"));
    }
    Ok(())
}

// ===== Request/Response DTOs =====

/// Request to create (or confirm) a collection
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 1, max = 255), custom(function = "validate_collection_name"))]
    pub name: String,
    #[validate(range(min = 1))]
    pub vector_size: u64,
    #[serde(default)]
    pub distance: DistanceMetric,
    #[serde(default)]
    pub on_disk_payload: Option<bool>,
}

/// One point in an upsert batch. Exactly one of `content` or `vector` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PointInput {
    #[serde(default)]
    pub id: Option<PointId>,
    /// Text to embed server-side.
    #[serde(default)]
    pub content: Option<String>,
    /// Precomputed vector; must match the embedding dimensionality.
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
    #[serde(default, alias = "metadata")]
    #[schema(value_type = Object)]
    pub payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpsertRequest {
    /// Target collection; the configured default when omitted.
    #[serde(default)]
    #[validate(length(min = 1, max = 255), custom(function = "validate_collection_name"))]
    pub collection: Option<String>,
    pub points: Vec<PointInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpsertResponse {
    pub collection: String,
    /// Ids in submission order, generated ones included.
    pub acknowledged: Vec<PointId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    pub query: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255), custom(function = "validate_collection_name"))]
    pub collection: Option<String>,
    #[serde(default, alias = "top_k")]
    pub limit: Option<u64>,
    #[serde(default, alias = "min_score")]
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub collection: String,
    /// Highest score first.
    pub results: Vec<ScoredPoint>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GetPointsRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255), custom(function = "validate_collection_name"))]
    pub collection: Option<String>,
    #[validate(length(min = 1))]
    pub ids: Vec<PointId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetPointsResponse {
    pub collection: String,
    pub points: Vec<StoredPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionList {
    pub collections: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distance_parsing_is_lenient() {
        for (raw, expected) in [
            ("cosine", DistanceMetric::Cosine),
            ("Cosine", DistanceMetric::Cosine),
            ("EUCLID", DistanceMetric::Euclidean),
            ("euclidean", DistanceMetric::Euclidean),
            ("dot", DistanceMetric::Dot),
            ("dot_product", DistanceMetric::Dot),
        ] {
            let parsed: DistanceMetric = serde_json::from_value(json!(raw)).unwrap();
            assert_eq!(parsed, expected, "{raw}");
        }

        assert!(serde_json::from_value::<DistanceMetric>(json!("manhattan")).is_err());
        assert_eq!(
            serde_json::to_value(DistanceMetric::Euclidean).unwrap(),
            json!("euclidean")
        );
        assert_eq!(DistanceMetric::Dot.to_string(), "dot");
    }

    #[test]
    fn test_point_id_accepts_numbers_and_strings() {
        let ids: Vec<PointId> = serde_json::from_value(json!([7, "a1"])).unwrap();
        assert_eq!(ids, vec![PointId::Num(7), PointId::Text("a1".into())]);
        assert_eq!(serde_json::to_value(&ids).unwrap(), json!([7, "a1"]));
    }

    #[test]
    fn test_point_input_accepts_metadata_alias() {
        let point: PointInput =
            serde_json::from_value(json!({"content": "hi", "metadata": {"role": "user"}}))
                .unwrap();
        assert_eq!(point.payload["role"], "user");
        assert!(point.id.is_none());
    }

    #[test]
    fn test_search_request_accepts_hook_field_names() {
        let req: SearchRequest =
            serde_json::from_value(json!({"query": "q", "top_k": 3, "min_score": 0.5})).unwrap();
        assert_eq!(req.limit, Some(3));
        assert_eq!(req.score_threshold, Some(0.5));
    }

    #[test]
    fn test_create_collection_validation() {
        let ok: CreateCollectionRequest =
            serde_json::from_value(json!({"name": "claude_vectors", "vector_size": 384}))
                .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.distance, DistanceMetric::Cosine);

        for bad in [
            json!({"name": "", "vector_size": 384}),
            json!({"name": "a/b", "vector_size": 384}),
            json!({"name": "ok", "vector_size": 0}),
        ] {
            let req: CreateCollectionRequest = serde_json::from_value(bad).unwrap();
            assert!(req.validate().is_err());
        }
    }
}
