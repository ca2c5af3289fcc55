//! Juggling kick counter.
//!
//! Turns per-frame ball detections and foot keypoints into de-duplicated
//! kick events, streaks and a technique score.
//!
//! ```ignore
//! use juggle_tracker::{analyze, AnalysisConfig};
//!
//! let result = analyze(frames, AnalysisConfig::default(), detector, pose_estimator)?;
//! println!("{}", result.summary());
//! ```

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod types;

pub use config::{AnalysisConfig, Config};
pub use error::ConfigError;
pub use pipeline::{analyze, CancellationToken, Pipeline};
pub use types::{AnalysisResult, FrameObservation, KickEvent, SourceFrame, Streak, TrajectorySample};
