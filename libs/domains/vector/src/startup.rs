//! Process startup shared by the API and MCP binaries.
//!
//! Order: configuration is already loaded; the store is awaited with
//! retries, the embedding model is loaded (fatal on failure), and the default
//! collection is ensured before any listener is bound.

use std::sync::Arc;

use tracing::info;

use crate::embedding::build_provider;
use crate::error::VectorResult;
use crate::qdrant::{QdrantConfig, QdrantRepository};
use crate::repository::VectorRepository;
use crate::retry::{RetryConfig, retry_with_backoff};
use crate::service::VectorService;
use crate::settings::GatewayConfig;

/// Block until the store answers a health probe or the retry budget runs out.
pub async fn wait_for_store<R: VectorRepository>(
    repository: &R,
    config: &QdrantConfig,
) -> VectorResult<()> {
    let retry = RetryConfig::fixed(config.connect_retries, config.retry_delay());
    retry_with_backoff("vector store", || repository.health(), &retry).await?;
    info!(url = %config.url, "Vector store reachable");
    Ok(())
}

pub async fn connect_qdrant(config: &GatewayConfig) -> VectorResult<Arc<QdrantRepository>> {
    let repository = QdrantRepository::connect(&config.qdrant, config.vector.indexed_only)?;
    wait_for_store(&repository, &config.qdrant).await?;
    Ok(Arc::new(repository))
}

/// Wire a service over any repository and ensure the default collection.
pub async fn build_service_with<R: VectorRepository + 'static>(
    repository: Arc<R>,
    config: &GatewayConfig,
) -> VectorResult<Arc<VectorService<R>>> {
    let embedder = build_provider(
        &config.embedding,
        config.vector.vector_size as usize,
        config.vector.max_tokens,
    )
    .await?;

    let service = VectorService::new(repository, embedder, config.vector.clone());
    let collection = service.ensure_default_collection().await?;
    info!(
        collection = %collection.name,
        shape = %collection.describe_shape(),
        points = collection.points_count,
        "Default collection ready"
    );
    Ok(Arc::new(service))
}

/// Production wiring: Qdrant plus the configured embedder.
pub async fn build_service(config: &GatewayConfig) -> VectorResult<Arc<VectorService<QdrantRepository>>> {
    let repository = connect_qdrant(config).await?;
    build_service_with(repository, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::ProviderKind;
    use crate::error::VectorError;
    use crate::memory::InMemoryRepository;
    use crate::models::{CollectionOptions, CollectionSpec, DistanceMetric};

    fn hashing_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.embedding.provider = ProviderKind::Hashing;
        config
    }

    #[tokio::test]
    async fn test_startup_creates_default_collection() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = build_service_with(Arc::clone(&repo), &hashing_config())
            .await
            .unwrap();

        let info = service.get_collection("claude_vectors").await.unwrap();
        assert_eq!(info.vector_size, 384);
        assert_eq!(info.distance, DistanceMetric::Cosine);
    }

    #[tokio::test]
    async fn test_startup_refuses_mismatched_default_collection() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.create_collection(&CollectionSpec {
            name: "claude_vectors".to_string(),
            vector_size: 768,
            distance: DistanceMetric::Cosine,
            options: CollectionOptions::default(),
        })
        .await
        .unwrap();

        let result = build_service_with(repo, &hashing_config()).await;
        assert!(matches!(result, Err(VectorError::CollectionMismatch { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_store_gives_up() {
        let repo = InMemoryRepository::new();
        repo.set_available(false);
        let config = QdrantConfig {
            connect_retries: 3,
            ..Default::default()
        };
        let err = wait_for_store(&repo, &config).await.unwrap_err();
        assert!(err.kind().is_retryable());
    }
}
