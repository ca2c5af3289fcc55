// src/detection/mod.rs

mod adapter;
pub mod replay;

pub use adapter::{BallDetector, DetectionAdapter, PoseEstimator, RawDetection, RawKeypoint};
pub use replay::{RecordedFrame, RecordingReader, ReplayDetector, ReplayPoseEstimator};
