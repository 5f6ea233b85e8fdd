//! The fixed tool surface
//!
//! Tools form a closed set: `ToolKind` names them, `ToolCall` carries their
//! typed arguments, and execution is one exhaustive `match`.

use std::str::FromStr;

use domain_vector::{
    CreateCollectionRequest, DistanceMetric, Payload, PointId, PointInput, SearchRequest,
    UpsertRequest, VectorRepository, VectorResult, VectorService,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::RpcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum ToolKind {
    #[strum(serialize = "qdrant-store")]
    Store,
    #[strum(serialize = "qdrant-find")]
    Find,
    #[strum(serialize = "qdrant-list-collections")]
    ListCollections,
    #[strum(serialize = "qdrant-create-collection")]
    CreateCollection,
}

impl ToolKind {
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Store => {
                "Store text in the vector database. The text is embedded and kept with optional metadata for later semantic retrieval."
            }
            ToolKind::Find => {
                "Semantic search. Returns stored entries most similar to the query, best match first."
            }
            ToolKind::ListCollections => "List the names of all collections.",
            ToolKind::CreateCollection => {
                "Create a collection, or confirm that one with the same shape already exists."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            ToolKind::Store => json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string", "description": "Text to store"},
                    "metadata": {"type": "object", "description": "Arbitrary JSON stored with the text"},
                    "collection": {"type": "string", "description": "Target collection (default collection if omitted)"},
                    "id": {"type": ["string", "integer"], "description": "Point id (generated if omitted)"}
                },
                "required": ["content"]
            }),
            ToolKind::Find => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "What to look for"},
                    "limit": {"type": "integer", "minimum": 1, "description": "Maximum number of results"},
                    "score_threshold": {"type": "number", "minimum": 0, "maximum": 1, "description": "Minimum similarity"},
                    "collection": {"type": "string", "description": "Collection to search (default collection if omitted)"}
                },
                "required": ["query"]
            }),
            ToolKind::ListCollections => json!({
                "type": "object",
                "properties": {}
            }),
            ToolKind::CreateCollection => json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Collection name"},
                    "vector_size": {"type": "integer", "minimum": 1, "description": "Dimension (embedder dimension if omitted)"},
                    "distance": {"type": "string", "enum": ["cosine", "euclidean", "dot"]}
                },
                "required": ["name"]
            }),
        }
    }

    /// Descriptor list for `tools/list`.
    pub fn catalog() -> Value {
        let tools: Vec<Value> = ToolKind::iter()
            .map(|tool| {
                json!({
                    "name": tool.to_string(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreArgs {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Payload>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub id: Option<PointId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub score_threshold: Option<f32>,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateCollectionArgs {
    pub name: String,
    #[serde(default)]
    pub vector_size: Option<u64>,
    #[serde(default)]
    pub distance: Option<DistanceMetric>,
}

/// A validated `tools/call`
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Store(StoreArgs),
    Find(FindArgs),
    ListCollections,
    CreateCollection(CreateCollectionArgs),
}

fn arguments<T: DeserializeOwned>(tool: ToolKind, arguments: Value) -> Result<T, RpcError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| RpcError::invalid_params(format!("Invalid arguments for {}: {}", tool, e)))
}

impl ToolCall {
    /// Resolve `tools/call` params into a typed call.
    pub fn parse(params: &Value) -> Result<Self, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("Missing tool name"))?;
        let tool = ToolKind::from_str(name)
            .map_err(|_| RpcError::invalid_params(format!("Unknown tool: {}", name)))?;
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);

        Ok(match tool {
            ToolKind::Store => ToolCall::Store(arguments(tool, args)?),
            ToolKind::Find => ToolCall::Find(arguments(tool, args)?),
            ToolKind::ListCollections => ToolCall::ListCollections,
            ToolKind::CreateCollection => ToolCall::CreateCollection(arguments(tool, args)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::Store(_) => ToolKind::Store,
            ToolCall::Find(_) => ToolKind::Find,
            ToolCall::ListCollections => ToolKind::ListCollections,
            ToolCall::CreateCollection(_) => ToolKind::CreateCollection,
        }
    }

    /// Run the call against the shared service; the value is the structured result.
    pub async fn execute<R: VectorRepository + 'static>(
        self,
        service: &VectorService<R>,
    ) -> VectorResult<Value> {
        let value = match self {
            ToolCall::Store(args) => serde_json::to_value(
                service
                    .upsert(UpsertRequest {
                        collection: args.collection,
                        points: vec![PointInput {
                            id: args.id,
                            content: Some(args.content),
                            vector: None,
                            payload: args.metadata.unwrap_or_default(),
                        }],
                    })
                    .await?,
            )?,
            ToolCall::Find(args) => serde_json::to_value(
                service
                    .search(SearchRequest {
                        query: args.query,
                        collection: args.collection,
                        limit: args.limit,
                        score_threshold: args.score_threshold,
                    })
                    .await?,
            )?,
            ToolCall::ListCollections => serde_json::to_value(service.list_collections().await?)?,
            ToolCall::CreateCollection(args) => serde_json::to_value(
                service
                    .create_collection(CreateCollectionRequest {
                        name: args.name,
                        vector_size: args
                            .vector_size
                            .unwrap_or(service.embedder().dimension() as u64),
                        distance: args.distance.unwrap_or(service.settings().distance),
                        on_disk_payload: None,
                    })
                    .await?,
            )?,
        };
        Ok(value)
    }
}

/// MCP `tools/call` result wrapping a structured value.
pub fn tool_result(structured: Value) -> Value {
    json!({
        "content": [{"type": "text", "text": structured.to_string()}],
        "structuredContent": structured,
        "isError": false,
    })
}
