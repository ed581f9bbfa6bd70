//! Gzip JSON encoding of analysis results.

use std::io::{Read, Write};

use deepscan_models::AnalysisResult;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{StorageError, StorageResult};

/// Serialize and gzip an analysis result.
pub fn compress_result(result: &AnalysisResult) -> StorageResult<Vec<u8>> {
    let json = serde_json::to_vec(result)
        .map_err(|e| StorageError::serialization(format!("Failed to serialize analysis: {}", e)))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| StorageError::serialization(format!("Failed to gzip analysis: {}", e)))?;

    encoder
        .finish()
        .map_err(|e| StorageError::serialization(format!("Failed to finish gzip encoding: {}", e)))
}

/// Decompress and deserialize a stored analysis result.
pub fn decompress_result(data: &[u8]) -> StorageResult<AnalysisResult> {
    let mut decoder = GzDecoder::new(data);
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| StorageError::Corrupt(format!("gzip: {}", e)))?;

    serde_json::from_slice(&json).map_err(|e| StorageError::Corrupt(format!("json: {}", e)))
}
