//! Qdrant test infrastructure
//!
//! Provides a `TestQdrant` helper that runs a disposable Qdrant container.

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const QDRANT_IMAGE: &str = "qdrant/qdrant";
const QDRANT_TAG: &str = "v1.15.1";
const GRPC_PORT: u16 = 6334;

/// Test Qdrant wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestQdrant;
///
/// # async fn example() {
/// let qdrant = TestQdrant::new().await;
/// let url = qdrant.grpc_url();
/// // Point a QdrantRepository at `url`
/// # }
/// ```
pub struct TestQdrant {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    grpc_url: String,
}

impl TestQdrant {
    /// Start a Qdrant container and wait until its gRPC listener is up.
    pub async fn new() -> Self {
        let container = GenericImage::new(QDRANT_IMAGE, QDRANT_TAG)
            .with_exposed_port(GRPC_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
            .with_env_var("QDRANT__TELEMETRY_DISABLED", "true")
            .start()
            .await
            .expect("Failed to start Qdrant container");

        let host = container
            .get_host()
            .await
            .expect("Failed to get Qdrant host");
        let grpc_port = container
            .get_host_port_ipv4(GRPC_PORT)
            .await
            .expect("Failed to get Qdrant gRPC port");

        let grpc_url = format!("http://{}:{}", host, grpc_port);

        tracing::info!(%grpc_url, "Test Qdrant ready ({})", QDRANT_TAG);

        Self {
            container,
            grpc_url,
        }
    }

    /// gRPC endpoint, as used by `qdrant-client`
    pub fn grpc_url(&self) -> &str {
        &self.grpc_url
    }
}

// Container is automatically cleaned up when TestQdrant is dropped
impl Drop for TestQdrant {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Qdrant container");
    }
}
