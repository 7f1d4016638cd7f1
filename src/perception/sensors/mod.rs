//! Detection sources for the localizer
//!
//! Camera capture and tag detection run outside this crate. A source hands
//! over the detections of one frame at a time.

use super::detection::TagDetection;
use crate::error::{LocalizerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// A generic detection source interface
pub trait DetectionSource {
    /// Get the source name
    fn name(&self) -> &str;

    /// Detections of the next frame, `None` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<Vec<TagDetection>>>;
}

/// One line of a replay file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub detections: Vec<TagDetection>,
}

/// Replays recorded detections from JSON Lines, one frame per line.
pub struct ReplaySource<R> {
    name: String,
    lines: Lines<R>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(ReplaySource::new(
            &path.display().to_string(),
            BufReader::new(file),
        ))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(name: &str, reader: R) -> Self {
        ReplaySource {
            name: name.to_string(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> DetectionSource for ReplaySource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Option<Vec<TagDetection>>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let record: FrameRecord =
                serde_json::from_str(&line).map_err(|source| LocalizerError::Json {
                    line: self.line_no,
                    source,
                })?;
            return Ok(Some(record.detections));
        }
        Ok(None)
    }
}

/// In-memory frames, handed out in order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Vec<TagDetection>>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Vec<TagDetection>>) -> Self {
        ScriptedSource {
            frames: frames.into_iter().collect(),
        }
    }
}

impl DetectionSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn next_frame(&mut self) -> Result<Option<Vec<TagDetection>>> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FRAME: &str = concat!(
        r#"{"detections": [{"id": 1, "decision_margin": 50.0, "pose_candidates": ["#,
        r#"{"translation": [0.5, 0.0, 2.0], "rotation": [0.0, 0.1, 0.0], "error": 0.001}"#,
        r#"]}]}"#
    );

    #[test]
    fn replays_frames_and_skips_blank_lines() {
        let text = format!("{FRAME}\n\n{{\"detections\": []}}\n{{}}\n");
        let mut source = ReplaySource::new("mem", Cursor::new(text));
        assert_eq!(source.next_frame().unwrap().unwrap().len(), 1);
        assert!(source.next_frame().unwrap().unwrap().is_empty());
        assert!(source.next_frame().unwrap().unwrap().is_empty());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let text = format!("{FRAME}\nnot json\n");
        let mut source = ReplaySource::new("mem", Cursor::new(text));
        source.next_frame().unwrap();
        match source.next_frame() {
            Err(LocalizerError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn scripted_source_drains_in_order() {
        let mut source = ScriptedSource::new(vec![Vec::new(), Vec::new()]);
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }
}
