//! Shared test utilities for domain testing
//!
//! - `TestQdrant`: Qdrant container with automatic cleanup (feature: "qdrant")
//! - `TestDataBuilder`: Deterministic collection names, ids and texts (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! Container tests need a running Docker daemon and are marked `#[ignore]`
//! by convention; run them with `cargo test -- --ignored`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestQdrant};
//!
//! #[tokio::test]
//! #[ignore]
//! async fn my_qdrant_test() {
//!     let qdrant = TestQdrant::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let collection = builder.collection("notes");
//!     let id = builder.point_id(0);
//! }
//! ```

use uuid::Uuid;

#[cfg(feature = "qdrant")]
mod qdrant;

#[cfg(feature = "qdrant")]
pub use qdrant::TestQdrant;

/// Builder for test data with deterministic randomization
///
/// Collection names derived from the test name keep tests that share one
/// store from seeing each other's points.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_upsert_roundtrip");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Collection name unique to this builder's seed
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.collection("notes"), "test_notes_7");
    /// ```
    pub fn collection(&self, prefix: &str) -> String {
        format!("test_{}_{}", prefix, self.seed)
    }

    /// Deterministic string point id
    pub fn point_id(&self, index: u64) -> String {
        let bytes = self.seed.to_le_bytes();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&bytes);
        uuid_bytes[8..16].copy_from_slice(&index.to_le_bytes());
        Uuid::from_bytes(uuid_bytes).to_string()
    }

    /// Text of `words` distinct tokens, stable for a given seed
    pub fn text(&self, words: usize) -> String {
        (0..words)
            .map(|i| format!("w{}x{}", self.seed % 997, i))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that scores are sorted best-first
    pub fn assert_descending(scores: &[f32], context: &str) {
        for pair in scores.windows(2) {
            assert!(
                pair[0] >= pair[1],
                "{}: scores not descending: {:?}",
                context,
                scores
            );
        }
    }
}
