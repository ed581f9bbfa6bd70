//! Process-wide model ownership.
//!
//! [`InferenceService`] loads both classifiers on first use and hands out
//! shared references afterwards. Loading is guarded by an async mutex with
//! the readiness check repeated after the guard is acquired, so concurrent
//! first requests trigger exactly one load.
//!
//! ```text
//! Unloaded ──▶ Loading ──▶ Ready
//!                  └─────▶ Failed
//! ```
//!
//! A failed load is kept: later callers get the same [`InferenceError::ModelLoad`]
//! without retrying, and classification degrades to per-frame error payloads.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::{InferenceError, InferenceResult};
use crate::model::ImageModel;

/// The two ensemble members.
#[derive(Clone)]
pub struct ModelPair {
    pub first: Arc<dyn ImageModel>,
    pub second: Arc<dyn ImageModel>,
}

impl ModelPair {
    pub fn new(first: Arc<dyn ImageModel>, second: Arc<dyn ImageModel>) -> Self {
        Self { first, second }
    }

    /// Use one model instance in both slots.
    pub fn shared(model: Arc<dyn ImageModel>) -> Self {
        Self {
            first: Arc::clone(&model),
            second: model,
        }
    }

    /// Whether both slots hold the same instance.
    pub fn is_shared(&self) -> bool {
        Arc::ptr_eq(&self.first, &self.second)
    }
}

impl fmt::Debug for ModelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPair")
            .field("first", &self.first.name())
            .field("second", &self.second.name())
            .finish()
    }
}

/// Builds the model pair. Blocking; run on the blocking pool.
pub trait ModelLoader: Send + Sync + 'static {
    fn load(&self) -> InferenceResult<ModelPair>;
}

impl<F> ModelLoader for F
where
    F: Fn() -> InferenceResult<ModelPair> + Send + Sync + 'static,
{
    fn load(&self) -> InferenceResult<ModelPair> {
        self()
    }
}

enum ModelState {
    Unloaded,
    Loading,
    Ready(ModelPair),
    Failed(String),
}

/// Externally visible service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Owner of the lazily loaded classifiers.
pub struct InferenceService {
    loader: Arc<dyn ModelLoader>,
    state: RwLock<ModelState>,
    load_guard: Mutex<()>,
}

impl InferenceService {
    pub fn new(loader: impl ModelLoader) -> Self {
        Self {
            loader: Arc::new(loader),
            state: RwLock::new(ModelState::Unloaded),
            load_guard: Mutex::new(()),
        }
    }

    /// Current state.
    pub fn status(&self) -> ServiceStatus {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            ModelState::Unloaded => ServiceStatus::Unloaded,
            ModelState::Loading => ServiceStatus::Loading,
            ModelState::Ready(_) => ServiceStatus::Ready,
            ModelState::Failed(_) => ServiceStatus::Failed,
        }
    }

    /// Models if already loaded. Never triggers a load.
    pub fn loaded(&self) -> Option<ModelPair> {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            ModelState::Ready(pair) => Some(pair.clone()),
            _ => None,
        }
    }

    /// Load failure message, if loading failed.
    pub fn failure(&self) -> Option<String> {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            ModelState::Failed(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Get the models, loading them on first use.
    pub async fn models(&self) -> InferenceResult<ModelPair> {
        if let Some(settled) = self.settled() {
            return settled;
        }

        let _guard = self.load_guard.lock().await;

        // Another caller may have finished loading while we waited
        if let Some(settled) = self.settled() {
            return settled;
        }

        self.set_state(ModelState::Loading);
        info!("Loading deepfake detection models");
        let started = Instant::now();

        let loader = Arc::clone(&self.loader);
        let result = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| InferenceError::model_load(format!("Model loading task failed: {}", e)))
            .and_then(|r| r);

        match result {
            Ok(pair) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    shared = pair.is_shared(),
                    "Models loaded"
                );
                self.set_state(ModelState::Ready(pair.clone()));
                Ok(pair)
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "Model loading failed");
                self.set_state(ModelState::Failed(message.clone()));
                Err(InferenceError::ModelLoad(message))
            }
        }
    }

    /// Outcome of a finished load, or `None` while unloaded.
    fn settled(&self) -> Option<InferenceResult<ModelPair>> {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            ModelState::Ready(pair) => Some(Ok(pair.clone())),
            ModelState::Failed(msg) => Some(Err(InferenceError::ModelLoad(msg.clone()))),
            ModelState::Unloaded | ModelState::Loading => None,
        }
    }

    fn set_state(&self, state: ModelState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

impl fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService")
            .field("status", &self.status())
            .finish()
    }
}
