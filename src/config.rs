// src/config.rs

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub input_dir: String,
    pub extension: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_dir: "recordings".to_string(),
            extension: "jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// ANALYSIS TUNABLES
// ============================================================================

/// Every threshold the kick pipeline consults. Immutable once handed to a
/// [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Only every Nth frame is submitted to the models
    pub frame_skip: u32,
    /// Minimum ball speed for a kick (px/frame)
    pub velocity_threshold: f32,
    /// Minimum heading change for a kick (degrees)
    pub trajectory_change_threshold: f32,
    /// Maximum ball-to-foot distance for a kick (px)
    pub kick_distance_threshold: f32,
    /// Detections below this confidence are treated as absent
    pub min_confidence_threshold: f32,
    /// Default: 2 × frame_skip
    pub max_gap_frames: Option<u64>,
    /// Default: 2 × frame_skip
    pub debounce_window: Option<u64>,
    /// Default: 4 × debounce_window
    pub streak_continuity_threshold: Option<u64>,
    /// Run the detector and the pose estimator on separate threads per frame
    pub parallel_inference: bool,
}

const STREAK_DEBOUNCE_MULTIPLIER: u64 = 4;

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_skip: 4,
            velocity_threshold: 8.0,
            trajectory_change_threshold: 25.0,
            kick_distance_threshold: 400.0,
            min_confidence_threshold: 0.6,
            max_gap_frames: None,
            debounce_window: None,
            streak_continuity_threshold: None,
            parallel_inference: false,
        }
    }
}

impl AnalysisConfig {
    pub fn max_gap_frames(&self) -> u64 {
        self.max_gap_frames.unwrap_or(2 * u64::from(self.frame_skip))
    }

    pub fn debounce_window(&self) -> u64 {
        self.debounce_window.unwrap_or(2 * u64::from(self.frame_skip))
    }

    /// Saturates at `u64::MAX`; `validate` rejects windows that would.
    pub fn streak_continuity_threshold(&self) -> u64 {
        self.streak_continuity_threshold
            .unwrap_or_else(|| self.debounce_window().saturating_mul(STREAK_DEBOUNCE_MULTIPLIER))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip == 0 {
            return Err(ConfigError::ZeroFrameSkip);
        }

        non_negative("velocity_threshold", self.velocity_threshold)?;
        non_negative("kick_distance_threshold", self.kick_distance_threshold)?;
        if self.kick_distance_threshold == 0.0 {
            return Err(ConfigError::NotPositive {
                field: "kick_distance_threshold",
                value: 0.0,
            });
        }

        within(
            "trajectory_change_threshold",
            self.trajectory_change_threshold,
            0.0,
            180.0,
        )?;
        within(
            "min_confidence_threshold",
            self.min_confidence_threshold,
            0.0,
            1.0,
        )?;

        let max_gap_frames = self.max_gap_frames();
        if max_gap_frames < u64::from(self.frame_skip) {
            return Err(ConfigError::GapBelowFrameSkip {
                max_gap_frames,
                frame_skip: self.frame_skip,
            });
        }

        let debounce = self.debounce_window();
        if self.streak_continuity_threshold.is_none()
            && debounce.checked_mul(STREAK_DEBOUNCE_MULTIPLIER).is_none()
        {
            return Err(ConfigError::DebounceTooLarge { debounce });
        }

        let streak = self.streak_continuity_threshold();
        if streak < debounce {
            return Err(ConfigError::StreakBelowDebounce { streak, debounce });
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold {
            field,
            value: f64::from(value),
        });
    }
    Ok(())
}

fn within(field: &'static str, value: f32, min: f64, max: f64) -> Result<(), ConfigError> {
    let v = f64::from(value);
    if !value.is_finite() || v < min || v > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: v,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_gap_frames(), 8);
        assert_eq!(cfg.debounce_window(), 8);
        assert_eq!(cfg.streak_continuity_threshold(), 32);
    }

    #[test]
    fn test_derived_defaults_follow_frame_skip() {
        let cfg = AnalysisConfig {
            frame_skip: 2,
            ..Default::default()
        };
        assert_eq!(cfg.max_gap_frames(), 4);
        assert_eq!(cfg.debounce_window(), 4);
        assert_eq!(cfg.streak_continuity_threshold(), 16);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let cfg = AnalysisConfig {
            velocity_threshold: -1.0,
            ..Default::default()
        };
        assert_matches!(
            cfg.validate(),
            Err(ConfigError::InvalidThreshold {
                field: "velocity_threshold",
                ..
            })
        );
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let cfg = AnalysisConfig {
            kick_distance_threshold: f32::NAN,
            ..Default::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_zero_kick_distance_rejected() {
        let cfg = AnalysisConfig {
            kick_distance_threshold: 0.0,
            ..Default::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::NotPositive { .. }));
    }

    #[test]
    fn test_zero_frame_skip_rejected() {
        let cfg = AnalysisConfig {
            frame_skip: 0,
            ..Default::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::ZeroFrameSkip));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let cfg = AnalysisConfig {
            min_confidence_threshold: 1.5,
            ..Default::default()
        };
        assert_matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                field: "min_confidence_threshold",
                ..
            })
        );
    }

    #[test]
    fn test_gap_below_frame_skip_rejected() {
        let cfg = AnalysisConfig {
            max_gap_frames: Some(2),
            ..Default::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::GapBelowFrameSkip { .. }));
    }

    #[test]
    fn test_streak_below_debounce_rejected() {
        let cfg = AnalysisConfig {
            debounce_window: Some(12),
            streak_continuity_threshold: Some(6),
            ..Default::default()
        };
        assert_matches!(
            cfg.validate(),
            Err(ConfigError::StreakBelowDebounce {
                streak: 6,
                debounce: 12
            })
        );
    }

    #[test]
    fn test_huge_debounce_window_rejected() {
        let yaml = "analysis:\n  debounce_window: 9223372036854775807\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_matches!(
            cfg.analysis.validate(),
            Err(ConfigError::DebounceTooLarge {
                debounce: 9223372036854775807
            })
        );
        assert_eq!(cfg.analysis.streak_continuity_threshold(), u64::MAX);
    }

    #[test]
    fn test_huge_debounce_with_explicit_streak_accepted() {
        let cfg = AnalysisConfig {
            debounce_window: Some(u64::MAX / 2),
            streak_continuity_threshold: Some(u64::MAX),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_config_uses_defaults() {
        let yaml = "analysis:\n  frame_skip: 3\n  velocity_threshold: 6.5\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.analysis.frame_skip, 3);
        assert_eq!(cfg.analysis.velocity_threshold, 6.5);
        assert_eq!(cfg.analysis.kick_distance_threshold, 400.0);
        assert_eq!(cfg.analysis.max_gap_frames(), 6);
        assert_eq!(cfg.logging.level, "info");
    }
}
