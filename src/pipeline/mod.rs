// src/pipeline/mod.rs

pub mod cancel;
pub mod metrics;
pub mod orchestrator;

pub use cancel::CancellationToken;
pub use metrics::{MetricsSummary, PipelineMetrics};
pub use orchestrator::{analyze, Pipeline};
