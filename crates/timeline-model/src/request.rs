//! Render request and result types.

use serde::{Deserialize, Serialize};

use clipline_common::clock::Timings;
use clipline_common::error::{ClipError, ClipResult};

use crate::timeline::Timeline;

/// Shortest accepted segment length in chunked mode.
pub const MIN_SEGMENT_SECS: f64 = 2.0;

/// Longest accepted segment length in chunked mode.
pub const MAX_SEGMENT_SECS: f64 = 15.0;

/// What the client wants rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Short low-latency preview (10 seconds).
    #[default]
    Preview,
    /// Full composite with captions and thumbnails.
    Final,
    /// One time window of the timeline.
    Segment,
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "16:9")]
    Landscape,
}

/// Output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Chunk selector for [`RenderMode::Segment`].
///
/// `index` is signed on the wire so negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub index: i64,
    pub length: f64,
}

/// Incoming render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub mode: RenderMode,

    #[serde(default)]
    pub format: Format,

    #[serde(default)]
    pub timeline: Timeline,

    /// Whether the client wants a caption file for final renders.
    #[serde(default = "default_true", alias = "captionsEnabled")]
    pub captions: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentSpec>,

    /// Run previews through the full pipeline instead of the fast path.
    #[serde(default)]
    pub full_preview: bool,
}

/// Published artifacts of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions_url: Option<String>,

    #[serde(default)]
    pub thumbnail_urls: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_meta: Option<SegmentMeta>,

    #[serde(default)]
    pub timings: Timings,
}

/// Window actually rendered in chunked mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub index: u64,
    pub start: f64,
    pub end: f64,
    pub length: f64,
}

fn default_true() -> bool {
    true
}

impl Format {
    pub fn dimensions(self) -> FrameSize {
        match self {
            Format::Vertical => FrameSize {
                width: 1080,
                height: 1920,
            },
            Format::Landscape => FrameSize {
                width: 1920,
                height: 1080,
            },
        }
    }

    /// Filename-safe form, e.g. `9x16`.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Vertical => "9x16",
            Format::Landscape => "16x9",
        }
    }

    /// Wire form, e.g. `9:16`.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Vertical => "9:16",
            Format::Landscape => "16:9",
        }
    }

    /// Thumbnail size preserving the output orientation.
    pub fn thumbnail_size(self) -> FrameSize {
        match self {
            Format::Vertical => FrameSize {
                width: 720,
                height: 1280,
            },
            Format::Landscape => FrameSize {
                width: 1280,
                height: 720,
            },
        }
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl RenderRequest {
    /// Parse a request body. Malformed JSON, unknown modes and unknown
    /// formats are client errors.
    pub fn from_json(body: &str) -> ClipResult<Self> {
        let request: Self = serde_json::from_str(body)
            .map_err(|e| ClipError::input(format!("malformed render request: {e}")))?;
        request.timeline.validate()?;
        Ok(request)
    }

    pub fn is_chunked(&self) -> bool {
        self.mode == RenderMode::Segment
    }
}

/// Format seconds for filenames: integral values print without decimals,
/// others with up to three.
pub fn format_secs(secs: f64) -> String {
    let rounded = (secs * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{rounded:.3}");
        text.trim_end_matches('0').to_string()
    }
}
