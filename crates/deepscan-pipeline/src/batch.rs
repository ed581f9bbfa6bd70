//! Batched frame classification.
//!
//! Frames are classified in small consecutive batches. Inside a batch at
//! most `max_workers` classifications run at once on the blocking pool, and
//! the batch is joined before the next one starts. At most `max_workers`
//! decoded images and input tensors are alive at any time: each is freed
//! when its `predict` call returns. After every batch the predictor's
//! [`reclaim`](FramePredictor::reclaim) hook runs, for backends that keep
//! caches between frames. This keeps peak memory low at the cost of latency.

use std::sync::Arc;
use std::time::Instant;

use deepscan_inference::FramePredictor;
use deepscan_media::Frame;
use deepscan_models::FramePrediction;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::metrics;

/// Drives a [`FramePredictor`] over sampled frames.
#[derive(Clone)]
pub struct BatchOrchestrator {
    predictor: Arc<dyn FramePredictor>,
    batch_size: usize,
    max_workers: usize,
}

impl BatchOrchestrator {
    /// Zero sizes are raised to 1.
    pub fn new(predictor: Arc<dyn FramePredictor>, batch_size: usize, max_workers: usize) -> Self {
        Self {
            predictor,
            batch_size: batch_size.max(1),
            max_workers: max_workers.max(1),
        }
    }

    /// Classify every frame. Output order matches `frames`.
    ///
    /// A failing or panicking classification only affects its own frame.
    pub async fn run(&self, frames: &[Frame]) -> Vec<FramePrediction> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let total_batches = frames.len().div_ceil(self.batch_size);
        let mut results = Vec::with_capacity(frames.len());

        for (batch_index, batch) in frames.chunks(self.batch_size).enumerate() {
            let started = Instant::now();

            let tasks = batch.iter().map(|frame| {
                let semaphore = Arc::clone(&semaphore);
                let predictor = Arc::clone(&self.predictor);
                let path = frame.path.clone();
                let time = frame.time;

                async move {
                    // Held until the blocking classification finishes
                    let _permit = semaphore.acquire_owned().await;
                    tokio::task::spawn_blocking(move || predictor.predict(&path, time)).await
                }
            });

            let outcomes = join_all(tasks).await;

            let batch_results: Vec<FramePrediction> = batch
                .iter()
                .zip(outcomes)
                .map(|(frame, outcome)| match outcome {
                    Ok(prediction) => prediction,
                    Err(e) => {
                        warn!(time = frame.time, error = %e, "Frame classification task failed");
                        FramePrediction::failed(frame.time, format!("Classification task failed: {}", e))
                    }
                })
                .collect();

            let errors = batch_results.iter().filter(|p| p.is_error()).count();
            metrics::record_frames(batch_results.len(), errors);

            debug!(
                batch = batch_index + 1,
                total_batches = total_batches,
                frames = batch_results.len(),
                errors = errors,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Batch classified"
            );

            results.extend(batch_results);
            self.predictor.reclaim();
        }

        results
    }
}
