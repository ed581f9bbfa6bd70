//! Video analysis pipeline.
//!
//! Turns one uploaded video into a persisted [`AnalysisResult`]:
//! frame sampling, batched ensemble classification, audio analysis,
//! timeline construction and report assembly.
//!
//! [`AnalysisResult`]: deepscan_models::AnalysisResult

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod scratch;
pub mod timeline;

pub use aggregate::{build_report, frame_statistics, FrameStats, ReportMeta};
pub use batch::BatchOrchestrator;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::AnalysisLogger;
pub use processor::{AnalysisPipeline, AnalysisRequest};
pub use scratch::ScratchSpace;
pub use timeline::build_timeline;
