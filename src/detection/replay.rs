// src/detection/replay.rs
//
// Frame source over recorded model output (one JSON object per line).
// Lets the pipeline run offline without decoding video or loading models.

use super::adapter::{BallDetector, PoseEstimator, RawDetection, RawKeypoint};
use crate::types::SourceFrame;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{error, warn};

/// Model output recorded for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub ball: Vec<RawDetection>,
    #[serde(default)]
    pub keypoints: Vec<RawKeypoint>,
    /// Set when the line could not be parsed; replay models fail on it.
    #[serde(skip)]
    pub corrupt: bool,
}

#[derive(Debug, Deserialize)]
struct RecordLine {
    frame_index: u64,
    timestamp: f64,
    #[serde(flatten)]
    frame: RecordedFrame,
}

pub struct RecordingReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    last: Option<(u64, f64)>,
}

impl RecordingReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordingReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            last: None,
        }
    }

    fn corrupt_frame(&self) -> SourceFrame<RecordedFrame> {
        let (index, timestamp) = self
            .last
            .map(|(i, t)| (i + 1, t))
            .unwrap_or((0, 0.0));
        SourceFrame::new(
            index,
            timestamp,
            RecordedFrame {
                corrupt: true,
                ..Default::default()
            },
        )
    }
}

impl<R: BufRead> Iterator for RecordingReader<R> {
    type Item = SourceFrame<RecordedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    error!("Recording read failed after line {}: {}", self.line_no, e);
                    return None;
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return match serde_json::from_str::<RecordLine>(&line) {
                Ok(record) => {
                    self.last = Some((record.frame_index, record.timestamp));
                    Some(SourceFrame::new(
                        record.frame_index,
                        record.timestamp,
                        record.frame,
                    ))
                }
                Err(e) => {
                    warn!("Line {} is not a valid frame record: {}", self.line_no, e);
                    let frame = self.corrupt_frame();
                    self.last = Some((frame.frame_index, frame.timestamp));
                    Some(frame)
                }
            };
        }
    }
}

/// Replays recorded ball detections.
#[derive(Debug, Default)]
pub struct ReplayDetector;

/// Replays recorded foot keypoints.
#[derive(Debug, Default)]
pub struct ReplayPoseEstimator;

impl BallDetector<RecordedFrame> for ReplayDetector {
    fn detect(&mut self, frame: &RecordedFrame) -> Result<Vec<RawDetection>> {
        if frame.corrupt {
            anyhow::bail!("recorded frame is corrupt");
        }
        Ok(frame.ball.clone())
    }
}

impl PoseEstimator<RecordedFrame> for ReplayPoseEstimator {
    fn estimate(&mut self, frame: &RecordedFrame) -> Result<Vec<RawKeypoint>> {
        if frame.corrupt {
            anyhow::bail!("recorded frame is corrupt");
        }
        Ok(frame.keypoints.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_frames_in_order() {
        let data = r#"{"frame_index":0,"timestamp":0.0,"ball":[{"bbox":[10,10,30,30],"confidence":0.9}],"keypoints":[{"x":20,"y":80,"confidence":0.8}]}
{"frame_index":1,"timestamp":0.033}

{"frame_index":2,"timestamp":0.066,"ball":[]}
"#;
        let frames: Vec<_> = RecordingReader::new(Cursor::new(data)).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].image.ball.len(), 1);
        assert_eq!(frames[0].image.keypoints.len(), 1);
        assert!(frames[1].image.ball.is_empty());
        assert_eq!(frames[2].frame_index, 2);
        assert!(frames.iter().all(|f| !f.image.corrupt));
    }

    #[test]
    fn test_unparseable_line_becomes_corrupt_frame() {
        let data = "{\"frame_index\":4,\"timestamp\":0.13}\nnot json\n";
        let frames: Vec<_> = RecordingReader::new(Cursor::new(data)).collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].image.corrupt);
        assert_eq!(frames[1].frame_index, 5);

        let mut detector = ReplayDetector;
        assert!(detector.detect(&frames[1].image).is_err());
        assert!(detector.detect(&frames[0].image).unwrap().is_empty());
    }
}
