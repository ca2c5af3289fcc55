// src/error.rs

/// Invalid tunable, rejected when a pipeline is constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("frame_skip must be at least 1")]
    ZeroFrameSkip,

    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must lie within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("max_gap_frames ({max_gap_frames}) is smaller than frame_skip ({frame_skip}); every sample would start a new segment")]
    GapBelowFrameSkip { max_gap_frames: u64, frame_skip: u32 },

    #[error("debounce_window ({debounce}) is too large to derive a streak_continuity_threshold")]
    DebounceTooLarge { debounce: u64 },

    #[error("streak_continuity_threshold ({streak}) is smaller than debounce_window ({debounce}); no streak could exceed one kick")]
    StreakBelowDebounce { streak: u64, debounce: u64 },
}
