//! Local filesystem analysis store.

use std::path::PathBuf;

use async_trait::async_trait;
use deepscan_models::{AnalysisId, AnalysisResult};
use tracing::{debug, info};

use crate::codec::{compress_result, decompress_result};
use crate::error::{StorageError, StorageResult};
use crate::AnalysisStore;

const RESULT_EXTENSION: &str = "json.gz";

/// Stores each analysis as `{root}/{id}.json.gz`.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers never observe a partial record.
#[derive(Debug, Clone)]
pub struct LocalAnalysisStore {
    root: PathBuf,
}

impl LocalAnalysisStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the record for `id`.
    pub fn path_for(&self, id: &AnalysisId) -> PathBuf {
        self.root
            .join(format!("{}.{}", id.as_str(), RESULT_EXTENSION))
    }

    fn temp_path_for(&self, id: &AnalysisId) -> PathBuf {
        self.root
            .join(format!(".{}.{}.tmp", id.as_str(), RESULT_EXTENSION))
    }
}

#[async_trait]
impl AnalysisStore for LocalAnalysisStore {
    async fn save(&self, id: &AnalysisId, result: &AnalysisResult) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let data = compress_result(result)?;
        let path = self.path_for(id);
        let temp = self.temp_path_for(id);

        tokio::fs::write(&temp, &data).await?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        info!(
            analysis_id = %id,
            path = %path.display(),
            compressed_size = data.len(),
            "Stored analysis result"
        );
        Ok(())
    }

    async fn load(&self, id: &AnalysisId) -> StorageResult<AnalysisResult> {
        let path = self.path_for(id);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(id.as_str()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(analysis_id = %id, size = data.len(), "Loaded analysis result");
        decompress_result(&data)
    }

    async fn exists(&self, id: &AnalysisId) -> StorageResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(id)).await?)
    }

    async fn health_check(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", self.root.display(), e)))?;

        let metadata = tokio::fs::metadata(&self.root).await?;
        if metadata.permissions().readonly() {
            return Err(StorageError::Unavailable(format!(
                "{} is read-only",
                self.root.display()
            )));
        }
        Ok(())
    }
}
