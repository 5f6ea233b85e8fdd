//! Vector Domain Library
//!
//! Embedding, collection provisioning and semantic search over Qdrant, shared
//! by the REST API and the MCP server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │  REST handlers   │   │   MCP sessions   │
//! └────────┬─────────┘   └────────┬─────────┘
//!          └──────────┬───────────┘
//!          ┌──────────▼──────────┐
//!          │    VectorService    │  ← validation, limits, ranking
//!          └──┬───────────────┬──┘
//!             │               │
//! ┌───────────▼──────┐ ┌──────▼────────────┐
//! │ CollectionManager│ │ EmbeddingProvider │
//! │ VectorRepository │ │     (trait)       │
//! └───────────┬──────┘ └──────┬────────────┘
//!             │               │
//! ┌───────────▼──────┐ ┌──────▼────────────┐
//! │ QdrantRepository │ │ FastEmbedProvider │
//! │InMemoryRepository│ │ OpenAIProvider    │
//! └──────────────────┘ │ HashingProvider   │
//!                      └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_vector::{ConfigOverrides, GatewayConfig, SearchRequest, build_service};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::load(&ConfigOverrides::default())?;
//! let service = build_service(&config).await?;
//!
//! let response = service
//!     .search(SearchRequest {
//!         query: "how do we rotate credentials".to_string(),
//!         collection: None,
//!         limit: Some(5),
//!         score_threshold: None,
//!     })
//!     .await?;
//! println!("{} matches", response.total);
//! # Ok(())
//! # }
//! ```

pub mod collections;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod retry;
pub mod service;
pub mod settings;
pub mod startup;

// Re-export commonly used types
pub use collections::CollectionManager;
pub use embedding::{EmbeddingConfig, EmbeddingProvider, HashingProvider, ProviderKind};
pub use error::{ErrorKind, VectorError, VectorResult};
pub use handlers::{GatewayApiDoc, router};
pub use memory::InMemoryRepository;
pub use models::{
    CollectionInfo, CollectionList, CollectionOptions, CollectionSpec, CollectionStatus,
    CreateCollectionRequest, DistanceMetric, GetPointsRequest, GetPointsResponse, Payload,
    PointId, PointInput, PointRecord, ScoredPoint, SearchRequest, SearchResponse, StoredPoint,
    UpsertRequest, UpsertResponse,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use repository::VectorRepository;
pub use service::VectorService;
pub use settings::{ConfigOverrides, GatewayConfig};
pub use startup::{build_service, build_service_with};
