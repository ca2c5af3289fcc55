// src/types.rs

use serde::{Deserialize, Serialize};

/// A decoded frame as handed over by the frame source.
///
/// `image` is opaque to the core; only the detector and pose estimator look
/// inside it.
#[derive(Debug, Clone)]
pub struct SourceFrame<F> {
    pub frame_index: u64,
    pub timestamp: f64,
    pub image: F,
}

impl<F> SourceFrame<F> {
    pub fn new(frame_index: u64, timestamp: f64, image: F) -> Self {
        Self {
            frame_index,
            timestamp,
            image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Ball bounding box in image pixels, `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    pub confidence: f32,
}

impl BallBox {
    pub fn centroid(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Finite coordinates with a non-inverted extent.
    pub fn is_well_formed(&self) -> bool {
        let coords = [self.x_min, self.y_min, self.x_max, self.y_max];
        coords.iter().all(|c| c.is_finite()) && self.x_max >= self.x_min && self.y_max >= self.y_min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootKeypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl FootKeypoint {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Per-sampled-frame record produced by the detection adapter.
///
/// Absent detections are `None`, never zeroed coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub frame_index: u64,
    pub timestamp: f64,
    pub ball_box: Option<BallBox>,
    pub foot_keypoints: Option<Vec<FootKeypoint>>,
}

impl FrameObservation {
    /// Observation with both sensor fields missing (sensor gap).
    pub fn absent(frame_index: u64, timestamp: f64) -> Self {
        Self {
            frame_index,
            timestamp,
            ball_box: None,
            foot_keypoints: None,
        }
    }

    /// Distance from `point` to the closest present foot keypoint.
    pub fn nearest_foot_distance(&self, point: &Point) -> Option<f32> {
        self.foot_keypoints
            .as_ref()?
            .iter()
            .map(|k| k.position().distance(point))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

/// Derived motion of the ball between two present observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Pixels per frame
    pub velocity: Velocity,
    pub speed: f32,
    /// Degrees in [0, 360), image coordinates (y grows downward)
    pub heading: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub frame_index: u64,
    pub timestamp: f64,
    pub position: Point,
    /// `None` for the first sample of a trajectory segment.
    pub motion: Option<Motion>,
    pub ball_confidence: f32,
    /// Closest foot keypoint, `None` when no foot was detected.
    pub foot_distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickEvent {
    pub frame_index: u64,
    pub timestamp: f64,
    pub trigger_position: Point,
    pub trigger_speed: f32,
    pub trigger_angle_delta: f32,
    pub foot_distance: f32,
    /// Ball detection confidence at the triggering frame
    pub confidence: f32,
}

/// Maximal run of kicks with no gap above the continuity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub start_frame: u64,
    pub end_frame: u64,
    pub kicks: u32,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_kicks: u32,
    pub longest_streak: u32,
    pub technique_score: f32,
    pub processing_seconds: f64,
    pub kick_events: Vec<KickEvent>,
    pub streaks: Vec<Streak>,
    pub frames_processed: u64,
    pub duration_seconds: f64,
}

impl AnalysisResult {
    pub fn empty(frames_processed: u64, duration_seconds: f64, processing_seconds: f64) -> Self {
        Self {
            total_kicks: 0,
            longest_streak: 0,
            technique_score: 0.0,
            processing_seconds,
            kick_events: Vec::new(),
            streaks: Vec::new(),
            frames_processed,
            duration_seconds,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} kicks in {} streaks over {:.1} s (longest streak {}, technique {:.1})",
            self.total_kicks,
            self.streaks.len(),
            self.duration_seconds,
            self.longest_streak,
            self.technique_score
        )
    }

    /// Equality on everything except wall-clock processing time.
    pub fn same_outcome(&self, other: &AnalysisResult) -> bool {
        self.total_kicks == other.total_kicks
            && self.longest_streak == other.longest_streak
            && self.technique_score.to_bits() == other.technique_score.to_bits()
            && self.kick_events == other.kick_events
            && self.streaks == other.streaks
            && self.frames_processed == other.frames_processed
            && self.duration_seconds.to_bits() == other.duration_seconds.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_is_box_center() {
        let b = BallBox {
            x_min: 100.0,
            y_min: 200.0,
            x_max: 140.0,
            y_max: 260.0,
            confidence: 0.9,
        };
        assert_eq!(b.centroid(), Point::new(120.0, 230.0));
        assert!(b.is_well_formed());
    }

    #[test]
    fn test_inverted_box_is_malformed() {
        let b = BallBox {
            x_min: 140.0,
            y_min: 200.0,
            x_max: 100.0,
            y_max: 260.0,
            confidence: 0.9,
        };
        assert!(!b.is_well_formed());
    }

    #[test]
    fn test_nearest_foot_distance() {
        let mut obs = FrameObservation::absent(0, 0.0);
        assert_eq!(obs.nearest_foot_distance(&Point::new(0.0, 0.0)), None);

        obs.foot_keypoints = Some(vec![
            FootKeypoint {
                x: 30.0,
                y: 40.0,
                confidence: 0.9,
            },
            FootKeypoint {
                x: 300.0,
                y: 400.0,
                confidence: 0.9,
            },
        ]);
        assert_eq!(obs.nearest_foot_distance(&Point::new(0.0, 0.0)), Some(50.0));
    }
}
