//! Segment synthesis: one video entry in, one clip out.
//!
//! Each entry is rendered by walking an ordered list of strategies, each
//! simpler than the one before:
//!
//! ```text
//! image:<url>  ── ImageMotion ──fail──▶ TextOverlay("Scene") ──fail──▶ SolidOnly
//! <label>      ───────────────────────▶ TextOverlay(label)   ──fail──▶ SolidOnly
//! ```
//!
//! Only a failure of the last strategy reaches the caller.

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use clipline_common::error::{ClipError, ClipResult};
use clipline_timeline::{FrameSize, Timed, VideoEntry, VideoSource};

use crate::backend::{
    frame_count, MediaBackend, SolidSpec, TextOverlay, ZoomSpec, OUTPUT_FPS, ZOOM_MAX, ZOOM_STEP,
};
use crate::clip::{Clip, ClipOrigin, EncodingSignature};
use crate::fetch::ImageFetcher;
use crate::scratch::Scratch;

/// Label used when an entry has nothing printable.
pub const GENERIC_LABEL: &str = "Scene";

/// Duration given to entries whose span is empty or malformed.
pub const DEFAULT_ENTRY_SECS: f64 = 3.0;

/// Shortest clip the synthesizer produces.
pub const MIN_ENTRY_SECS: f64 = 0.2;

/// Longest label drawn on screen, in characters.
pub const MAX_LABEL_CHARS: usize = 60;

const BACKGROUND_COLOR: &str = "black";
const FONT_SIZE: u32 = 48;
const FONT_COLOR: &str = "white";
const BOX_COLOR: &str = "0x00000088";

static BROLL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*broll:").expect("valid regex"));
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[A-Za-z_][\w-]*\s*=\s*("[^"]*"|'[^']*'|\S+)"#).expect("valid regex")
});
static STRAY_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>\[\]{}]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// One way of producing a clip for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Zoom motion over a fetched image.
    ImageMotion { url: String },
    /// Solid background with a centered label.
    TextOverlay { label: String },
    /// Plain solid background.
    SolidOnly,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::ImageMotion { .. } => "image_motion",
            Strategy::TextOverlay { .. } => "text_overlay",
            Strategy::SolidOnly => "solid_only",
        }
    }
}

/// Ordered strategies for `entry`, most faithful first.
pub fn plan_strategies(entry: &VideoEntry) -> Vec<Strategy> {
    match entry.source() {
        VideoSource::Image { url } => vec![
            Strategy::ImageMotion {
                url: url.to_string(),
            },
            Strategy::TextOverlay {
                label: GENERIC_LABEL.to_string(),
            },
            Strategy::SolidOnly,
        ],
        VideoSource::Label { text } => vec![
            Strategy::TextOverlay {
                label: sanitize_label(text),
            },
            Strategy::SolidOnly,
        ],
    }
}

/// Clean up a free-form label for on-screen display.
///
/// Drops a leading `broll:`, markup tags, `key=value` attributes and stray
/// brackets, collapses whitespace and caps the length. Falls back to
/// [`GENERIC_LABEL`] when nothing is left.
pub fn sanitize_label(raw: &str) -> String {
    let text = BROLL_PREFIX.replace(raw, "");
    let text = MARKUP_TAG.replace_all(&text, " ");
    let text = ATTRIBUTE.replace_all(&text, " ");
    let text = STRAY_BRACKETS.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    let capped: String = text.trim().chars().take(MAX_LABEL_CHARS).collect();
    let capped = capped.trim_end();
    if capped.is_empty() {
        GENERIC_LABEL.to_string()
    } else {
        capped.to_string()
    }
}

/// Length of the clip rendered for `entry`.
pub fn entry_duration(entry: &VideoEntry) -> f64 {
    let width = entry.width();
    if !width.is_finite() || width <= 0.0 {
        DEFAULT_ENTRY_SECS
    } else {
        width.max(MIN_ENTRY_SECS)
    }
}

/// Renders single entries at one output size.
#[derive(Clone)]
pub struct SegmentSynthesizer {
    backend: Arc<dyn MediaBackend>,
    fetcher: Arc<dyn ImageFetcher>,
    font_path: PathBuf,
    size: FrameSize,
}

impl SegmentSynthesizer {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        fetcher: Arc<dyn ImageFetcher>,
        font_path: PathBuf,
        size: FrameSize,
    ) -> Self {
        Self {
            backend,
            fetcher,
            font_path,
            size,
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Render entry `index` of the track.
    pub async fn synthesize(
        &self,
        index: usize,
        entry: &VideoEntry,
        scratch: &Scratch,
    ) -> ClipResult<Clip> {
        let duration = entry_duration(entry);
        let strategies = plan_strategies(entry);
        let last = strategies.len() - 1;

        let mut failure = None;
        for (position, strategy) in strategies.iter().enumerate() {
            match self.run_strategy(strategy, duration, scratch).await {
                Ok(clip) => {
                    tracing::debug!(
                        index,
                        strategy = strategy.name(),
                        duration_secs = duration,
                        "Synthesized segment"
                    );
                    return Ok(clip);
                }
                Err(err) if position < last => {
                    tracing::warn!(
                        index,
                        strategy = strategy.name(),
                        error = %err,
                        "Segment strategy failed, falling back"
                    );
                }
                Err(err) => failure = Some(err),
            }
        }

        Err(failure.unwrap_or_else(|| ClipError::backend("no segment strategy available")))
    }

    async fn run_strategy(
        &self,
        strategy: &Strategy,
        duration: f64,
        scratch: &Scratch,
    ) -> ClipResult<Clip> {
        match strategy {
            Strategy::ImageMotion { url } => {
                let image = self.fetcher.fetch(url, scratch).await?;
                let out = scratch.file("motion", "mp4");
                let spec = ZoomSpec {
                    image,
                    size: self.size,
                    duration_secs: duration,
                    fps: OUTPUT_FPS,
                    frames: frame_count(duration, OUTPUT_FPS),
                    zoom_step: ZOOM_STEP,
                    zoom_max: ZOOM_MAX,
                };
                self.backend.zoom_image(&spec, &out).await?;
                Ok(self.video_clip(out, duration, ClipOrigin::Motion))
            }
            Strategy::TextOverlay { label } => {
                let text = TextOverlay {
                    text: label.clone(),
                    font_path: self.font_path.clone(),
                    font_size: FONT_SIZE,
                    font_color: FONT_COLOR.to_string(),
                    box_color: BOX_COLOR.to_string(),
                };
                self.solid(duration, Some(text), scratch).await
            }
            Strategy::SolidOnly => self.solid(duration, None, scratch).await,
        }
    }

    async fn solid(
        &self,
        duration: f64,
        text: Option<TextOverlay>,
        scratch: &Scratch,
    ) -> ClipResult<Clip> {
        let out = scratch.file(if text.is_some() { "label" } else { "solid" }, "mp4");
        let spec = SolidSpec {
            size: self.size,
            duration_secs: duration,
            fps: OUTPUT_FPS,
            color: BACKGROUND_COLOR.to_string(),
            text,
        };
        self.backend.solid(&spec, &out).await?;
        Ok(self.video_clip(out, duration, ClipOrigin::Solid))
    }

    fn video_clip(&self, path: PathBuf, duration: f64, origin: ClipOrigin) -> Clip {
        Clip::new(path, duration, EncodingSignature::video(origin, self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_for_image_entry() {
        let entry = VideoEntry::new(0.0, 5.0, "IMAGE:https://example.com/a.jpg");
        assert_eq!(
            plan_strategies(&entry),
            vec![
                Strategy::ImageMotion {
                    url: "https://example.com/a.jpg".into()
                },
                Strategy::TextOverlay {
                    label: "Scene".into()
                },
                Strategy::SolidOnly,
            ]
        );
    }

    #[test]
    fn test_plan_for_label_entry() {
        let entry = VideoEntry::new(0.0, 5.0, "broll:City at night");
        assert_eq!(
            plan_strategies(&entry),
            vec![
                Strategy::TextOverlay {
                    label: "City at night".into()
                },
                Strategy::SolidOnly,
            ]
        );
    }

    #[test]
    fn test_sanitize_strips_markup_and_attributes() {
        assert_eq!(
            sanitize_label(r#"BROLL:<scene mood="calm">Sunrise   over   hills</scene>"#),
            "Sunrise over hills"
        );
        assert_eq!(sanitize_label("Ocean waves style=slow [b-roll]"), "Ocean waves b-roll");
        assert_eq!(sanitize_label("It's 10:30"), "It's 10:30");
    }

    #[test]
    fn test_sanitize_falls_back_to_generic() {
        assert_eq!(sanitize_label(""), GENERIC_LABEL);
        assert_eq!(sanitize_label("broll:"), GENERIC_LABEL);
        assert_eq!(sanitize_label("<br/> <i></i>"), GENERIC_LABEL);
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "word ".repeat(40);
        let label = sanitize_label(&long);
        assert!(label.chars().count() <= MAX_LABEL_CHARS);
        assert!(!label.ends_with(' '));

        let accented = "é".repeat(100);
        assert_eq!(sanitize_label(&accented).chars().count(), MAX_LABEL_CHARS);
    }

    #[test]
    fn test_entry_duration() {
        assert_eq!(entry_duration(&VideoEntry::new(0.0, 5.0, "x")), 5.0);
        assert_eq!(entry_duration(&VideoEntry::new(1.0, 1.1, "x")), MIN_ENTRY_SECS);
        assert_eq!(entry_duration(&VideoEntry::new(4.0, 4.0, "x")), DEFAULT_ENTRY_SECS);
        assert_eq!(entry_duration(&VideoEntry::new(4.0, 2.0, "x")), DEFAULT_ENTRY_SECS);
        assert_eq!(
            entry_duration(&VideoEntry::new(0.0, f64::INFINITY, "x")),
            DEFAULT_ENTRY_SECS
        );
    }
}
