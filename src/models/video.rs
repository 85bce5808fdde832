//! Video export models

use std::path::PathBuf;

/// Frames per second of every exported video
pub const FRAME_RATE: u32 = 30;

/// Result of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub frame_count: usize,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl RenderedVideo {
    /// Playback length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.fps as f64
    }
}
