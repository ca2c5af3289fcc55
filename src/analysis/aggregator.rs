// src/analysis/aggregator.rs
//
// Folds the ordered kick-event sequence into the final AnalysisResult:
// total count, streaks, technique score.

use crate::types::{AnalysisResult, KickEvent, Streak};
use tracing::info;

// ============================================================================
// TECHNIQUE SCORE
// ============================================================================
//
// score = 100 * volume * (W_REG * regularity + W_CONF * confidence)
//
//   volume     = 1 - exp(-kicks / VOLUME_SCALE)
//   regularity = 1 / (1 + cv²), cv = stddev / mean of inter-kick intervals
//   confidence = mean ball detection confidence of the kicks
//
// Each factor is non-decreasing in its input, so more kicks or more regular
// intervals never lower the score with the rest held fixed.
const VOLUME_SCALE: f64 = 10.0;
const REGULARITY_WEIGHT: f64 = 0.6;
const CONFIDENCE_WEIGHT: f64 = 0.4;

pub struct SessionAggregator {
    streak_continuity_threshold: u64,
}

impl SessionAggregator {
    pub fn new(streak_continuity_threshold: u64) -> Self {
        Self {
            streak_continuity_threshold,
        }
    }

    /// `kick_events` should be in frame order. Unordered input does not
    /// panic but may merge streaks that would otherwise split.
    pub fn aggregate(
        &self,
        kick_events: Vec<KickEvent>,
        frames_processed: u64,
        duration_seconds: f64,
        processing_seconds: f64,
    ) -> AnalysisResult {
        if kick_events.is_empty() {
            info!("No kicks detected in {} frames", frames_processed);
            return AnalysisResult::empty(frames_processed, duration_seconds, processing_seconds);
        }

        let streaks = self.streaks(&kick_events);
        let longest_streak = streaks.iter().map(|s| s.kicks).max().unwrap_or(0);
        let technique_score = technique_score(&kick_events);

        let result = AnalysisResult {
            total_kicks: kick_events.len() as u32,
            longest_streak,
            technique_score,
            processing_seconds,
            kick_events,
            streaks,
            frames_processed,
            duration_seconds,
        };

        info!("{}", result.summary());
        result
    }

    /// Split the events wherever two consecutive kicks are further apart
    /// than the continuity threshold.
    pub fn streaks(&self, events: &[KickEvent]) -> Vec<Streak> {
        let mut streaks = Vec::new();
        let Some(first) = events.first() else {
            return streaks;
        };

        let mut start = first;
        let mut end = first;
        let mut kicks = 1u32;

        for event in &events[1..] {
            let gap = event.frame_index.saturating_sub(end.frame_index);
            if gap > self.streak_continuity_threshold {
                streaks.push(make_streak(start, end, kicks));
                start = event;
                kicks = 0;
            }
            end = event;
            kicks += 1;
        }
        streaks.push(make_streak(start, end, kicks));

        streaks
    }
}

fn make_streak(start: &KickEvent, end: &KickEvent, kicks: u32) -> Streak {
    Streak {
        start_frame: start.frame_index,
        end_frame: end.frame_index,
        kicks,
        duration_seconds: end.timestamp - start.timestamp,
    }
}

/// Bounded [0, 100] quality score; 0 for an empty session.
pub fn technique_score(events: &[KickEvent]) -> f32 {
    if events.is_empty() {
        return 0.0;
    }

    let volume = 1.0 - (-(events.len() as f64) / VOLUME_SCALE).exp();
    let regularity = regularity(events);
    let confidence = (events.iter().map(|e| f64::from(e.confidence)).sum::<f64>()
        / events.len() as f64)
        .clamp(0.0, 1.0);

    let score = 100.0 * volume * (REGULARITY_WEIGHT * regularity + CONFIDENCE_WEIGHT * confidence);
    score.clamp(0.0, 100.0) as f32
}

/// 1.0 for perfectly even intervals, approaching 0 as they scatter.
fn regularity(events: &[KickEvent]) -> f64 {
    let intervals: Vec<f64> = events
        .windows(2)
        .map(|w| w[1].frame_index.abs_diff(w[0].frame_index) as f64)
        .collect();

    if intervals.len() < 2 {
        return 1.0;
    }

    let n = intervals.len() as f64;
    let mean = intervals.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 1.0;
    }
    let variance = intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / n;
    let cv_squared = variance / (mean * mean);

    1.0 / (1.0 + cv_squared)
}
