//! Media backend boundary.
//!
//! The pipeline never encodes anything itself. It describes each operation
//! with a spec and hands it to a [`MediaBackend`], which writes the result to
//! the given output path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use clipline_common::error::ClipResult;
use clipline_timeline::FrameSize;

/// Output frame rate of every generated clip.
pub const OUTPUT_FPS: u32 = 30;

/// Pixel format of every generated clip.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Video codec of every generated clip.
pub const VIDEO_CODEC: &str = "libx264";

/// Audio codec of muxed output.
pub const AUDIO_CODEC: &str = "aac";

/// Per-frame zoom increment of the image motion effect.
pub const ZOOM_STEP: f64 = 0.0015;

/// Zoom cap of the image motion effect.
pub const ZOOM_MAX: f64 = 1.05;

/// Solid background clip, optionally with centered boxed text.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidSpec {
    pub size: FrameSize,
    pub duration_secs: f64,
    pub fps: u32,
    pub color: String,
    pub text: Option<TextOverlay>,
}

/// Centered text drawn over a solid background.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub font_path: PathBuf,
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
}

/// Slow zoom-in over a still image.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomSpec {
    pub image: PathBuf,
    pub size: FrameSize,
    pub duration_secs: f64,
    pub fps: u32,
    pub frames: u64,
    pub zoom_step: f64,
    pub zoom_max: f64,
}

/// How clips are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// Stream-level join without re-encoding.
    Copy,
    /// Decode and encode again with the fixed output settings.
    Reencode,
}

/// A generated background bed mixed under the voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedSpec {
    pub volume: f64,
    pub sample_rate: u32,
}

/// Attach audio to a video stream. Video is always stream-copied.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxSpec {
    pub video: PathBuf,
    pub voice: PathBuf,
    pub voice_gain: f64,
    pub bed: Option<BedSpec>,
    /// Output is cut to this length.
    pub duration_secs: f64,
}

/// The operations the pipeline needs from an encoding engine.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Check if this backend can run on the system.
    async fn is_available(&self) -> bool;

    /// Solid clip, with text when `spec.text` is set.
    async fn solid(&self, spec: &SolidSpec, out: &Path) -> ClipResult<()>;

    /// Zoom motion clip from a still image.
    async fn zoom_image(&self, spec: &ZoomSpec, out: &Path) -> ClipResult<()>;

    /// Join same-format clips in order.
    async fn concat(&self, inputs: &[&Path], mode: ConcatMode, out: &Path) -> ClipResult<()>;

    /// Mux voice (and optionally a bed) onto a video.
    async fn mux_audio(&self, spec: &MuxSpec, out: &Path) -> ClipResult<()>;

    /// Extract a still frame at `at_secs`.
    async fn extract_frame(
        &self,
        input: &Path,
        at_secs: f64,
        size: FrameSize,
        out: &Path,
    ) -> ClipResult<()>;

    /// Cut a clip down to `duration_secs`.
    async fn trim(&self, input: &Path, duration_secs: f64, out: &Path) -> ClipResult<()>;

    /// Silent audio of `duration_secs` (voice stand-in).
    async fn silence(&self, duration_secs: f64, sample_rate: u32, out: &Path) -> ClipResult<()>;
}

/// Number of frames for a clip of `duration_secs` at `fps`; at least one.
pub fn frame_count(duration_secs: f64, fps: u32) -> u64 {
    let frames = (duration_secs * fps as f64).round();
    if frames.is_finite() && frames >= 1.0 {
        frames as u64
    } else {
        1
    }
}
