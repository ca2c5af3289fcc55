// src/analysis/trajectory.rs
//
// Ball trajectory tracker.
//
// One sample per observation with a present ball box. Velocity is the
// centroid displacement since the previous present observation divided by
// the frame distance. A gap wider than max_gap_frames starts a new segment:
// the sample carries no motion rather than a velocity bridging the occlusion.

use crate::types::{FrameObservation, Motion, Point, TrajectorySample, Velocity};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct TrajectoryTracker {
    max_gap_frames: u64,
    /// Last present centroid and its frame index
    last: Option<(u64, Point)>,
    /// Last observation index seen, present or not
    last_frame: Option<u64>,
}

impl TrajectoryTracker {
    pub fn new(max_gap_frames: u64) -> Self {
        Self {
            max_gap_frames,
            last: None,
            last_frame: None,
        }
    }

    pub fn update(&mut self, observation: &FrameObservation) -> Option<TrajectorySample> {
        if let Some(prev) = self.last_frame {
            if observation.frame_index <= prev {
                warn!(
                    "Discarding out-of-order observation {} (last {})",
                    observation.frame_index, prev
                );
                return None;
            }
        }
        self.last_frame = Some(observation.frame_index);

        let ball = observation.ball_box?;
        let position = ball.centroid();

        let motion = match self.last {
            Some((prev_frame, prev_pos)) => {
                let frames = observation.frame_index - prev_frame;
                if frames > self.max_gap_frames {
                    debug!(
                        "Gap of {} frames before {} exceeds {}; new segment",
                        frames, observation.frame_index, self.max_gap_frames
                    );
                    None
                } else {
                    Some(motion_between(prev_pos, position, frames))
                }
            }
            None => None,
        };

        self.last = Some((observation.frame_index, position));

        Some(TrajectorySample {
            frame_index: observation.frame_index,
            timestamp: observation.timestamp,
            position,
            motion,
            ball_confidence: ball.confidence,
            foot_distance: observation.nearest_foot_distance(&position),
        })
    }
}

fn motion_between(from: Point, to: Point, frames: u64) -> Motion {
    let dt = frames as f32;
    let vx = (to.x - from.x) / dt;
    let vy = (to.y - from.y) / dt;
    Motion {
        velocity: Velocity { vx, vy },
        speed: (vx * vx + vy * vy).sqrt(),
        heading: heading_degrees(vx, vy),
    }
}

/// atan2 heading in degrees, normalized to [0, 360).
pub fn heading_degrees(vx: f32, vy: f32) -> f32 {
    let deg = vy.atan2(vx).to_degrees();
    let normalized = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Smallest absolute difference between two headings, in [0, 180].
pub fn angle_delta(a: f32, b: f32) -> f32 {
    let d = (a - b).abs().rem_euclid(360.0);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Lazy sample sequence over an observation stream.
pub struct Samples<I> {
    observations: I,
    tracker: TrajectoryTracker,
}

impl<I> Samples<I>
where
    I: Iterator<Item = FrameObservation>,
{
    pub fn new(observations: I, max_gap_frames: u64) -> Self {
        Self {
            observations,
            tracker: TrajectoryTracker::new(max_gap_frames),
        }
    }
}

impl<I> Iterator for Samples<I>
where
    I: Iterator<Item = FrameObservation>,
{
    type Item = TrajectorySample;

    fn next(&mut self) -> Option<Self::Item> {
        for observation in self.observations.by_ref() {
            if let Some(sample) = self.tracker.update(&observation) {
                return Some(sample);
            }
        }
        None
    }
}
