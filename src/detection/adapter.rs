// src/detection/adapter.rs
//
// Normalizes raw detector / pose output into one FrameObservation per
// sampled frame. Model failures become sensor gaps here and go no further.

use crate::config::AnalysisConfig;
use crate::pipeline::PipelineMetrics;
use crate::types::{BallBox, FootKeypoint, FrameObservation, SourceFrame};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Raw ball detection, `[x1, y1, x2, y2]` in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: [f32; 4],
    pub confidence: f32,
}

/// Raw foot keypoint in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawKeypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Object detector restricted to the ball class.
pub trait BallDetector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<RawDetection>>;
}

/// Pose estimator restricted to foot-relevant keypoints.
pub trait PoseEstimator<F> {
    fn estimate(&mut self, frame: &F) -> Result<Vec<RawKeypoint>>;
}

pub struct DetectionAdapter<D, P> {
    detector: D,
    pose_estimator: P,
    frame_skip: u64,
    min_confidence: f32,
    parallel: bool,
    metrics: PipelineMetrics,
}

impl<D, P> DetectionAdapter<D, P> {
    pub fn new(
        detector: D,
        pose_estimator: P,
        config: &AnalysisConfig,
        metrics: PipelineMetrics,
    ) -> Self {
        Self {
            detector,
            pose_estimator,
            frame_skip: u64::from(config.frame_skip.max(1)),
            min_confidence: config.min_confidence_threshold,
            parallel: config.parallel_inference,
            metrics,
        }
    }

    pub fn is_sampled(&self, frame_index: u64) -> bool {
        frame_index % self.frame_skip == 0
    }

    /// Returns `None` for frames skipped by the sampling stride.
    pub fn observe<F>(&mut self, frame: &SourceFrame<F>) -> Option<FrameObservation>
    where
        D: BallDetector<F> + Send,
        P: PoseEstimator<F> + Send,
        F: Sync,
    {
        if !self.is_sampled(frame.frame_index) {
            return None;
        }
        self.metrics.inc(&self.metrics.frames_sampled);

        let (balls, feet) = if self.parallel {
            let detector = &mut self.detector;
            let pose_estimator = &mut self.pose_estimator;
            let image = &frame.image;
            std::thread::scope(|s| {
                let pose = s.spawn(move || pose_estimator.estimate(image));
                let balls = detector.detect(image);
                let feet = pose
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("pose estimator panicked")));
                (balls, feet)
            })
        } else {
            (
                self.detector.detect(&frame.image),
                self.pose_estimator.estimate(&frame.image),
            )
        };

        let (balls, feet) = match (balls, feet) {
            (Ok(balls), Ok(feet)) => (balls, feet),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    "Model call failed on frame {}: {:#}; recording sensor gap",
                    frame.frame_index, e
                );
                self.metrics.inc(&self.metrics.model_failures);
                return Some(FrameObservation::absent(frame.frame_index, frame.timestamp));
            }
        };

        let observation = FrameObservation {
            frame_index: frame.frame_index,
            timestamp: frame.timestamp,
            ball_box: self.best_ball(&balls, frame.frame_index),
            foot_keypoints: self.confident_feet(&feet),
        };

        if observation.ball_box.is_some() {
            self.metrics.inc(&self.metrics.frames_with_ball);
        }
        if observation.foot_keypoints.is_some() {
            self.metrics.inc(&self.metrics.frames_with_feet);
        }

        debug!(
            "Frame {}: ball={} feet={}",
            frame.frame_index,
            observation.ball_box.is_some(),
            observation.foot_keypoints.as_ref().map_or(0, Vec::len)
        );

        Some(observation)
    }

    /// Highest-confidence ball above threshold.
    fn best_ball(&self, detections: &[RawDetection], frame_index: u64) -> Option<BallBox> {
        let best = detections
            .iter()
            .filter(|d| d.confidence >= self.min_confidence)
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;

        let ball = BallBox {
            x_min: best.bbox[0],
            y_min: best.bbox[1],
            x_max: best.bbox[2],
            y_max: best.bbox[3],
            confidence: best.confidence,
        };

        if !ball.is_well_formed() {
            warn!("Discarding malformed ball box on frame {}: {:?}", frame_index, best.bbox);
            return None;
        }
        Some(ball)
    }

    fn confident_feet(&self, keypoints: &[RawKeypoint]) -> Option<Vec<FootKeypoint>> {
        let feet: Vec<FootKeypoint> = keypoints
            .iter()
            .filter(|k| k.confidence >= self.min_confidence && k.x.is_finite() && k.y.is_finite())
            .map(|k| FootKeypoint {
                x: k.x,
                y: k.y,
                confidence: k.confidence,
            })
            .collect();

        if feet.is_empty() {
            None
        } else {
            Some(feet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    /// Frame payload carrying whatever the stub models should report.
    struct StubFrame {
        balls: Vec<RawDetection>,
        feet: Vec<RawKeypoint>,
        corrupt: bool,
    }

    struct StubDetector;
    struct StubPose;

    impl BallDetector<StubFrame> for StubDetector {
        fn detect(&mut self, frame: &StubFrame) -> Result<Vec<RawDetection>> {
            if frame.corrupt {
                anyhow::bail!("corrupt frame");
            }
            Ok(frame.balls.clone())
        }
    }

    impl PoseEstimator<StubFrame> for StubPose {
        fn estimate(&mut self, frame: &StubFrame) -> Result<Vec<RawKeypoint>> {
            Ok(frame.feet.clone())
        }
    }

    fn adapter(config: &AnalysisConfig) -> DetectionAdapter<StubDetector, StubPose> {
        DetectionAdapter::new(StubDetector, StubPose, config, PipelineMetrics::new())
    }

    fn ball(x: f32, y: f32, confidence: f32) -> RawDetection {
        RawDetection {
            bbox: [x - 10.0, y - 10.0, x + 10.0, y + 10.0],
            confidence,
        }
    }

    fn foot(x: f32, y: f32, confidence: f32) -> RawKeypoint {
        RawKeypoint { x, y, confidence }
    }

    fn frame(
        index: u64,
        balls: Vec<RawDetection>,
        feet: Vec<RawKeypoint>,
    ) -> SourceFrame<StubFrame> {
        SourceFrame::new(
            index,
            index as f64 / 30.0,
            StubFrame {
                balls,
                feet,
                corrupt: false,
            },
        )
    }

    #[test]
    fn test_skipped_frames_produce_no_observation() {
        let mut a = adapter(&AnalysisConfig::default());
        assert!(a.observe(&frame(0, vec![], vec![])).is_some());
        for i in 1..4 {
            assert!(a.observe(&frame(i, vec![ball(10.0, 10.0, 0.9)], vec![])).is_none());
        }
        assert!(a.observe(&frame(4, vec![], vec![])).is_some());
    }

    #[test]
    fn test_low_confidence_ball_is_absent() {
        let mut a = adapter(&AnalysisConfig::default());
        let obs = a.observe(&frame(0, vec![ball(50.0, 50.0, 0.4)], vec![])).unwrap();
        assert_eq!(obs.ball_box, None);
        assert_eq!(obs.foot_keypoints, None);
    }

    #[test]
    fn test_highest_confidence_ball_wins() {
        let mut a = adapter(&AnalysisConfig::default());
        let obs = a
            .observe(&frame(
                0,
                vec![ball(50.0, 50.0, 0.7), ball(200.0, 300.0, 0.95)],
                vec![],
            ))
            .unwrap();
        let b = obs.ball_box.unwrap();
        assert_eq!(b.confidence, 0.95);
        assert_eq!(b.centroid().x, 200.0);
    }

    #[test]
    fn test_feet_filtered_by_confidence() {
        let mut a = adapter(&AnalysisConfig::default());
        let obs = a
            .observe(&frame(
                0,
                vec![],
                vec![foot(10.0, 10.0, 0.9), foot(20.0, 20.0, 0.3)],
            ))
            .unwrap();
        assert_eq!(obs.foot_keypoints.unwrap().len(), 1);

        let obs = a.observe(&frame(4, vec![], vec![foot(10.0, 10.0, 0.1)])).unwrap();
        assert_eq!(obs.foot_keypoints, None);
    }

    #[test]
    fn test_model_failure_becomes_gap() {
        let metrics = PipelineMetrics::new();
        let mut a = DetectionAdapter::new(
            StubDetector,
            StubPose,
            &AnalysisConfig::default(),
            metrics.clone(),
        );
        let corrupt = SourceFrame::new(
            8,
            0.27,
            StubFrame {
                balls: vec![ball(50.0, 50.0, 0.99)],
                feet: vec![foot(50.0, 60.0, 0.99)],
                corrupt: true,
            },
        );
        let obs = a.observe(&corrupt).unwrap();
        assert_eq!(obs, FrameObservation::absent(8, 0.27));
        assert_eq!(metrics.model_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_parallel_inference_matches_sequential() {
        let parallel_cfg = AnalysisConfig {
            parallel_inference: true,
            ..Default::default()
        };
        let mut seq = adapter(&AnalysisConfig::default());
        let mut par = adapter(&parallel_cfg);

        let f = frame(0, vec![ball(80.0, 90.0, 0.8)], vec![foot(85.0, 140.0, 0.8)]);
        assert_eq!(seq.observe(&f), par.observe(&f));
    }

    #[test]
    fn test_malformed_box_is_absent() {
        let mut a = adapter(&AnalysisConfig::default());
        let bad = RawDetection {
            bbox: [100.0, 100.0, 50.0, f32::NAN],
            confidence: 0.9,
        };
        let obs = a.observe(&frame(0, vec![bad], vec![])).unwrap();
        assert_eq!(obs.ball_box, None);
    }
}
