use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, info, warn};

use crate::models::ChartRequest;
use crate::services::price_service::display_symbol;
use crate::utils::errors::GeneratorError;

/// `{prefix}-{assetType}_{symbol}_{start}_{end}.mp4`
pub fn output_filename(request: &ChartRequest) -> String {
    format!(
        "{}-{}_{}_{}_{}.mp4",
        request.prefix,
        request.asset_class.tag(),
        display_symbol(&request.symbol),
        request.start_date.format("%Y-%m-%d"),
        request.end_date.format("%Y-%m-%d"),
    )
}

pub fn output_path(request: &ChartRequest) -> PathBuf {
    request.output_dir.join(output_filename(request))
}

/// Refuse to clobber an existing video unless forced
pub fn check_overwrite(path: &Path, force: bool) -> Result<(), GeneratorError> {
    if path.exists() && !force {
        return Err(GeneratorError::Export(format!(
            "{} already exists. Use --force to overwrite",
            path.display()
        )));
    }
    Ok(())
}

/// Sink for raw RGB24 frames
pub trait VideoEncoder {
    fn write_frame(&mut self, rgb: &[u8]) -> Result<(), GeneratorError>;
    /// Flush and close the output
    fn finish(&mut self) -> Result<(), GeneratorError>;
    /// Stop encoding and remove any partial output
    fn abort(&mut self);
}

/// Encodes frames by piping them into an external `ffmpeg` process
pub struct FfmpegEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    path: PathBuf,
}

impl FfmpegEncoder {
    /// Start `ffmpeg` reading raw frames of `width`x`height` from stdin
    pub fn spawn(
        ffmpeg: &str,
        path: &Path,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, GeneratorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                GeneratorError::Export(format!(
                    "Failed to create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        debug!("Spawning {} for {} ({}x{} @ {} fps)", ffmpeg, path.display(), width, height, fps);
        let mut child = Command::new(ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostats", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .arg("-s")
            .arg(format!("{}x{}", width, height))
            .arg("-r")
            .arg(fps.to_string())
            .args(["-i", "-"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GeneratorError::Export(format!("Failed to start encoder '{}': {}", ffmpeg, e)))?;

        let stdin = child.stdin.take();
        Ok(Self {
            child: Some(child),
            stdin,
            path: path.to_path_buf(),
        })
    }

    fn remove_partial(&self) {
        if self.path.exists() {
            match fs::remove_file(&self.path) {
                Ok(_) => debug!("✓ Removed partial output {}", self.path.display()),
                Err(e) => warn!("Failed to remove partial output {}: {}", self.path.display(), e),
            }
        }
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn write_frame(&mut self, rgb: &[u8]) -> Result<(), GeneratorError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| GeneratorError::Export("Encoder input is already closed".to_string()))?;
        stdin
            .write_all(rgb)
            .map_err(|e| GeneratorError::Export(format!("Failed to write frame to encoder: {}", e)))
    }

    fn finish(&mut self) -> Result<(), GeneratorError> {
        // Closing stdin tells ffmpeg the stream is complete
        drop(self.stdin.take());

        let child = self
            .child
            .take()
            .ok_or_else(|| GeneratorError::Export("Encoder already finished".to_string()))?;
        let output = child
            .wait_with_output()
            .map_err(|e| GeneratorError::Export(format!("Failed to wait for encoder: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            self.remove_partial();
            return Err(GeneratorError::Export(format!(
                "Encoder exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        info!("✓ Encoded {}", self.path.display());
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Encoder already stopped: {}", e);
            }
            if let Err(e) = child.wait() {
                debug!("Failed to reap encoder: {}", e);
            }
        }
        self.remove_partial();
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}
