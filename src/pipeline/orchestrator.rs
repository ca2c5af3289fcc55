// src/pipeline/orchestrator.rs
//
// Wires the stages into one lazy chain per video:
//
//   SourceFrame → DetectionAdapter → Samples → KickEvents → SessionAggregator
//
// Frames are pulled strictly in order and nothing is buffered between
// stages. Stopping the pull (source exhausted or cancelled) ends the run.

use super::cancel::CancellationToken;
use super::metrics::PipelineMetrics;
use crate::analysis::{KickDetectorConfig, KickEvents, Samples, SessionAggregator};
use crate::config::AnalysisConfig;
use crate::detection::{BallDetector, DetectionAdapter, PoseEstimator};
use crate::error::ConfigError;
use crate::types::{AnalysisResult, KickEvent, SourceFrame};
use std::time::Instant;
use tracing::{info, warn};

pub struct Pipeline<D, P> {
    config: AnalysisConfig,
    adapter: DetectionAdapter<D, P>,
    metrics: PipelineMetrics,
}

impl<D, P> Pipeline<D, P> {
    /// Validates `config` up front; a bad threshold never reaches a frame.
    pub fn new(
        config: AnalysisConfig,
        detector: D,
        pose_estimator: P,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Pipeline thresholds: skip={}, velocity={:.1}, turn={:.1}°, foot={:.0}px, conf={:.2}, gap={}, debounce={}, streak={}",
            config.frame_skip,
            config.velocity_threshold,
            config.trajectory_change_threshold,
            config.kick_distance_threshold,
            config.min_confidence_threshold,
            config.max_gap_frames(),
            config.debounce_window(),
            config.streak_continuity_threshold()
        );

        let metrics = PipelineMetrics::new();
        let adapter = DetectionAdapter::new(detector, pose_estimator, &config, metrics.clone());

        Ok(Self {
            config,
            adapter,
            metrics,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn analyze<F, S>(&mut self, source: S) -> AnalysisResult
    where
        S: IntoIterator<Item = SourceFrame<F>>,
        D: BallDetector<F> + Send,
        P: PoseEstimator<F> + Send,
        F: Sync,
    {
        self.analyze_until(source, &CancellationToken::new())
    }

    /// Like [`analyze`](Self::analyze), but stops pulling frames once
    /// `cancel` is set and aggregates whatever was seen so far.
    ///
    /// Metrics are reset at the start of every run, so `metrics()` always
    /// describes the most recent one.
    pub fn analyze_until<F, S>(&mut self, source: S, cancel: &CancellationToken) -> AnalysisResult
    where
        S: IntoIterator<Item = SourceFrame<F>>,
        D: BallDetector<F> + Send,
        P: PoseEstimator<F> + Send,
        F: Sync,
    {
        self.metrics.reset();
        let started = Instant::now();
        let max_gap_frames = self.config.max_gap_frames();
        let kick_config = KickDetectorConfig::from(&self.config);
        let aggregator = SessionAggregator::new(self.config.streak_continuity_threshold());

        let metrics = &self.metrics;
        let adapter = &mut self.adapter;
        let mut frames_processed = 0u64;
        let mut span: Option<(f64, f64)> = None;

        let observations = source
            .into_iter()
            .take_while(|_| !cancel.is_cancelled())
            .inspect(|frame| {
                frames_processed += 1;
                metrics.inc(&metrics.frames_pulled);
                span = Some(match span {
                    None => (frame.timestamp, frame.timestamp),
                    Some((first, last)) => (first, last.max(frame.timestamp)),
                });
            })
            .filter_map(|frame| adapter.observe(&frame));

        let samples = Samples::new(observations, max_gap_frames).inspect(|sample| {
            metrics.inc(&metrics.trajectory_samples);
            if sample.motion.is_none() {
                metrics.inc(&metrics.segment_starts);
            }
        });

        let kick_events: Vec<KickEvent> = KickEvents::new(samples, kick_config)
            .inspect(|_| metrics.inc(&metrics.kicks_detected))
            .collect();

        if cancel.is_cancelled() {
            warn!("Analysis cancelled after {} frames", frames_processed);
        }

        let duration_seconds = span.map_or(0.0, |(first, last)| last - first);
        let processing_seconds = started.elapsed().as_secs_f64();

        let summary = self.metrics.summary();
        info!(
            "✓ Pipeline finished: {} frames ({} sampled, {} with ball, {} model failures), {} samples, {} kicks in {:.2}s",
            summary.frames_pulled,
            summary.frames_sampled,
            summary.frames_with_ball,
            summary.model_failures,
            summary.trajectory_samples,
            summary.kicks_detected,
            processing_seconds
        );

        aggregator.aggregate(kick_events, frames_processed, duration_seconds, processing_seconds)
    }
}

/// One-shot analysis of a frame source with a fresh pipeline.
pub fn analyze<F, S, D, P>(
    source: S,
    config: AnalysisConfig,
    detector: D,
    pose_estimator: P,
) -> Result<AnalysisResult, ConfigError>
where
    S: IntoIterator<Item = SourceFrame<F>>,
    D: BallDetector<F> + Send,
    P: PoseEstimator<F> + Send,
    F: Sync,
{
    let mut pipeline = Pipeline::new(config, detector, pose_estimator)?;
    Ok(pipeline.analyze(source))
}
