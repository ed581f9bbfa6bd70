//! Per-request scratch space.
//!
//! Holds the uploaded video and the sampled frames for one analysis under
//! `{scratch_dir}/{analysis_id}`. The directory is removed when the guard is
//! dropped, on success, error and unwinding alike. Removal failures are
//! logged and never returned.

use std::path::{Path, PathBuf};

use deepscan_models::AnalysisId;
use tracing::{debug, warn};

use crate::error::PipelineResult;

const FRAMES_DIR: &str = "frames";
const MAX_FILE_NAME_LEN: usize = 100;

/// Guard owning one request's scratch directory.
#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
    removed: bool,
}

impl ScratchSpace {
    /// Create `{base}/{id}` with an empty frames directory.
    pub async fn create(base: &Path, id: &AnalysisId) -> PipelineResult<Self> {
        let root = base.join(id.as_str());
        tokio::fs::create_dir_all(root.join(FRAMES_DIR)).await?;
        debug!(path = %root.display(), "Created scratch space");
        Ok(Self {
            root,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Staging directory for sampled frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join(FRAMES_DIR)
    }

    /// Where to store an upload named `file_name`.
    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        self.root
            .join(format!("upload_{}", sanitize_file_name(file_name)))
    }

    /// Delete the sampled frames once classification is done.
    pub async fn remove_frames(&self) {
        match tokio::fs::remove_dir_all(self.frames_dir()).await {
            Ok(()) => debug!(path = %self.root.display(), "Removed frame files"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.frames_dir().display(),
                error = %e,
                "Failed to remove frame files"
            ),
        }
    }

    /// Remove the whole scratch directory.
    pub async fn cleanup(mut self) {
        remove_logged(tokio::fs::remove_dir_all(&self.root).await, &self.root);
        self.removed = true;
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if !self.removed {
            remove_logged(std::fs::remove_dir_all(&self.root), &self.root);
        }
    }
}

fn remove_logged(result: std::io::Result<()>, path: &Path) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Removed scratch space"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch space"),
    }
}

/// Reduce a client-supplied file name to a safe single path component.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "video".to_string();
    }

    // Keep the tail so the extension survives truncation
    let skip = cleaned.len().saturating_sub(MAX_FILE_NAME_LEN);
    cleaned[skip..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\videos\\my clip.mov"), "my_clip.mov");
        assert_eq!(sanitize_file_name(".."), "video");
        assert_eq!(sanitize_file_name(""), "video");

        let long = format!("{}.mp4", "a".repeat(300));
        let cleaned = sanitize_file_name(&long);
        assert_eq!(cleaned.len(), MAX_FILE_NAME_LEN);
        assert!(cleaned.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_dropped_guard_removes_everything() {
        let base = TempDir::new().unwrap();
        let id = AnalysisId::new();
        let root;
        {
            let scratch = ScratchSpace::create(base.path(), &id).await.unwrap();
            root = scratch.path().to_path_buf();
            tokio::fs::write(scratch.upload_path("clip.mp4"), b"video").await.unwrap();
            tokio::fs::write(scratch.frames_dir().join("sample_000000.jpg"), b"jpg")
                .await
                .unwrap();
            assert!(root.exists());
        }
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_remove_frames_keeps_upload() {
        let base = TempDir::new().unwrap();
        let scratch = ScratchSpace::create(base.path(), &AnalysisId::new())
            .await
            .unwrap();
        let upload = scratch.upload_path("clip.mp4");
        tokio::fs::write(&upload, b"video").await.unwrap();

        scratch.remove_frames().await;
        assert!(!scratch.frames_dir().exists());
        assert!(upload.exists());

        // Second removal is a no-op
        scratch.remove_frames().await;

        let root = scratch.path().to_path_buf();
        scratch.cleanup().await;
        assert!(!root.exists());
    }
}
