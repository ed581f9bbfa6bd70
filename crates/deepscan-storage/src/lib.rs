//! Analysis result persistence.
//!
//! Results are stored as gzip-compressed JSON, keyed by analysis id.

pub mod codec;
pub mod error;
pub mod local;

use async_trait::async_trait;
use deepscan_models::{AnalysisId, AnalysisResult};

pub use codec::{compress_result, decompress_result};
pub use error::{StorageError, StorageResult};
pub use local::LocalAnalysisStore;

/// Durable storage for finished analyses.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Store a result under its id. Results are written once and never updated.
    async fn save(&self, id: &AnalysisId, result: &AnalysisResult) -> StorageResult<()>;

    /// Load a stored result. Missing ids yield [`StorageError::NotFound`].
    async fn load(&self, id: &AnalysisId) -> StorageResult<AnalysisResult>;

    async fn exists(&self, id: &AnalysisId) -> StorageResult<bool>;

    /// Verify the backing store is reachable and writable.
    async fn health_check(&self) -> StorageResult<()>;
}
