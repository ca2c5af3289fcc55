// src/pipeline/metrics.rs
//
// Per-run diagnostics. Counters are shared handles so a caller can poll
// progress while the pipeline runs on another thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub frames_pulled: Arc<AtomicU64>,
    pub frames_sampled: Arc<AtomicU64>,
    pub frames_with_ball: Arc<AtomicU64>,
    pub frames_with_feet: Arc<AtomicU64>,
    pub model_failures: Arc<AtomicU64>,
    pub trajectory_samples: Arc<AtomicU64>,
    pub segment_starts: Arc<AtomicU64>,
    pub kicks_detected: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            frames_pulled: Arc::new(AtomicU64::new(0)),
            frames_sampled: Arc::new(AtomicU64::new(0)),
            frames_with_ball: Arc::new(AtomicU64::new(0)),
            frames_with_feet: Arc::new(AtomicU64::new(0)),
            model_failures: Arc::new(AtomicU64::new(0)),
            trajectory_samples: Arc::new(AtomicU64::new(0)),
            segment_starts: Arc::new(AtomicU64::new(0)),
            kicks_detected: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    /// Zeroes every counter and restarts the clock. Clones keep sharing
    /// the counters, but only this handle's `started_at` moves.
    pub fn reset(&mut self) {
        for counter in [
            &self.frames_pulled,
            &self.frames_sampled,
            &self.frames_with_ball,
            &self.frames_with_feet,
            &self.model_failures,
            &self.trajectory_samples,
            &self.segment_starts,
            &self.kicks_detected,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.started_at = Instant::now();
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.frames_pulled.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_pulled: self.frames_pulled.load(Ordering::Relaxed),
            frames_sampled: self.frames_sampled.load(Ordering::Relaxed),
            frames_with_ball: self.frames_with_ball.load(Ordering::Relaxed),
            frames_with_feet: self.frames_with_feet.load(Ordering::Relaxed),
            model_failures: self.model_failures.load(Ordering::Relaxed),
            trajectory_samples: self.trajectory_samples.load(Ordering::Relaxed),
            segment_starts: self.segment_starts.load(Ordering::Relaxed),
            kicks_detected: self.kicks_detected.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_pulled: u64,
    pub frames_sampled: u64,
    pub frames_with_ball: u64,
    pub frames_with_feet: u64,
    pub model_failures: u64,
    pub trajectory_samples: u64,
    pub segment_starts: u64,
    pub kicks_detected: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = PipelineMetrics::new();
        let handle = metrics.clone();
        metrics.inc(&metrics.frames_pulled);
        handle.inc(&handle.frames_pulled);
        assert_eq!(metrics.summary().frames_pulled, 2);
    }

    #[test]
    fn test_reset_clears_shared_counters() {
        let mut metrics = PipelineMetrics::new();
        let handle = metrics.clone();
        handle.inc(&handle.kicks_detected);
        handle.inc(&handle.model_failures);
        metrics.reset();
        assert_eq!(handle.summary().kicks_detected, 0);
        assert_eq!(metrics.summary().model_failures, 0);
    }
}
