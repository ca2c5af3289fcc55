// src/analysis/mod.rs
//
// Kick analysis stages.
//
// Signal flow:
//   FrameObservation → trajectory (Samples) → kick_detector (KickEvents)
//                    → aggregator → AnalysisResult
//
// Every stage is a synchronous transformation over an in-memory sequence.

pub mod aggregator;
pub mod kick_detector;
pub mod trajectory;

pub use aggregator::{technique_score, SessionAggregator};
pub use kick_detector::{DetectorState, KickDetector, KickDetectorConfig, KickEvents};
pub use trajectory::{angle_delta, heading_degrees, Samples, TrajectoryTracker};
