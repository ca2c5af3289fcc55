// src/analysis/kick_detector.rs
//
// Kick event detection.
//
// A sample triggers a kick when, while IDLE, all three gates hold:
//   speed          >= velocity_threshold
//   heading change >= trajectory_change_threshold  (vs. last retained heading)
//   foot distance  <= kick_distance_threshold
//
// After a kick the detector sits in COOLDOWN until debounce_window frames
// have passed since the kick. The first sample after cooldown only seeds the
// heading baseline, so post-contact jitter cannot fire immediately.

use super::trajectory::angle_delta;
use crate::config::AnalysisConfig;
use crate::types::{KickEvent, TrajectorySample};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Cooldown { kick_frame: u64 },
}

#[derive(Debug, Clone)]
pub struct KickDetectorConfig {
    pub velocity_threshold: f32,
    pub trajectory_change_threshold: f32,
    pub kick_distance_threshold: f32,
    pub debounce_window: u64,
}

impl From<&AnalysisConfig> for KickDetectorConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            velocity_threshold: config.velocity_threshold,
            trajectory_change_threshold: config.trajectory_change_threshold,
            kick_distance_threshold: config.kick_distance_threshold,
            debounce_window: config.debounce_window(),
        }
    }
}

impl Default for KickDetectorConfig {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

pub struct KickDetector {
    config: KickDetectorConfig,
    state: DetectorState,
    baseline_heading: Option<f32>,
    last_seen: Option<(u64, f64)>,
    kicks_emitted: u32,
}

impl KickDetector {
    pub fn new(config: KickDetectorConfig) -> Self {
        Self {
            config,
            state: DetectorState::Idle,
            baseline_heading: None,
            last_seen: None,
            kicks_emitted: 0,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn kicks_emitted(&self) -> u32 {
        self.kicks_emitted
    }

    pub fn update(&mut self, sample: &TrajectorySample) -> Option<KickEvent> {
        if let Some((frame, timestamp)) = self.last_seen {
            if sample.frame_index <= frame || sample.timestamp < timestamp {
                warn!(
                    "Discarding out-of-order sample: frame {} @ {:.3}s after frame {} @ {:.3}s",
                    sample.frame_index, sample.timestamp, frame, timestamp
                );
                return None;
            }
        }
        self.last_seen = Some((sample.frame_index, sample.timestamp));

        // No derived motion: segment start after a gap
        let Some(motion) = sample.motion else {
            self.baseline_heading = None;
            return None;
        };

        match self.state {
            DetectorState::Cooldown { kick_frame } => {
                if sample.frame_index - kick_frame < self.config.debounce_window {
                    return None;
                }
                self.state = DetectorState::Idle;
                self.baseline_heading = Some(motion.heading);
                None
            }

            DetectorState::Idle => {
                let Some(baseline) = self.baseline_heading else {
                    self.baseline_heading = Some(motion.heading);
                    return None;
                };

                let delta = angle_delta(baseline, motion.heading);
                let fast_enough = motion.speed >= self.config.velocity_threshold;
                let turned = delta >= self.config.trajectory_change_threshold;
                let near_foot = sample
                    .foot_distance
                    .filter(|d| *d <= self.config.kick_distance_threshold);

                match near_foot {
                    Some(foot_distance) if fast_enough && turned => {
                        self.state = DetectorState::Cooldown {
                            kick_frame: sample.frame_index,
                        };
                        self.baseline_heading = None;
                        self.kicks_emitted += 1;

                        info!(
                            "Kick #{} at frame {} ({:.2}s): speed {:.1} px/f, turn {:.1}°, foot {:.0} px",
                            self.kicks_emitted,
                            sample.frame_index,
                            sample.timestamp,
                            motion.speed,
                            delta,
                            foot_distance
                        );

                        Some(KickEvent {
                            frame_index: sample.frame_index,
                            timestamp: sample.timestamp,
                            trigger_position: sample.position,
                            trigger_speed: motion.speed,
                            trigger_angle_delta: delta,
                            foot_distance,
                            confidence: sample.ball_confidence,
                        })
                    }
                    _ => {
                        debug!(
                            "Frame {}: speed {:.1} ({}), turn {:.1}° ({}), foot {:?}",
                            sample.frame_index,
                            motion.speed,
                            fast_enough,
                            delta,
                            turned,
                            sample.foot_distance
                        );
                        self.baseline_heading = Some(motion.heading);
                        None
                    }
                }
            }
        }
    }
}

/// Lazy kick-event sequence over a trajectory sample stream.
pub struct KickEvents<I> {
    samples: I,
    detector: KickDetector,
}

impl<I> KickEvents<I>
where
    I: Iterator<Item = TrajectorySample>,
{
    pub fn new(samples: I, config: KickDetectorConfig) -> Self {
        Self {
            samples,
            detector: KickDetector::new(config),
        }
    }
}

impl<I> Iterator for KickEvents<I>
where
    I: Iterator<Item = TrajectorySample>,
{
    type Item = KickEvent;

    fn next(&mut self) -> Option<Self::Item> {
        for sample in self.samples.by_ref() {
            if let Some(event) = self.detector.update(&sample) {
                return Some(event);
            }
        }
        None
    }
}
