//! Timeline and track types.
//!
//! A timeline is the declarative description of one short video. Entries
//! within a track need not be contiguous: gaps and overlaps are tolerated,
//! and each video entry is rendered independently.

use serde::{Deserialize, Serialize};

use clipline_common::error::{ClipError, ClipResult};

/// Frame rate assumed when a timeline does not declare one.
pub const DEFAULT_FPS: u32 = 30;

/// Ducking volume used for background music without a `vol` hint.
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.35;

/// Marker prefix for image-backed video entries.
pub const IMAGE_MARKER: &str = "image:";

/// Root input of a render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Declared total duration. Advisory only.
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default)]
    pub tracks: Tracks,
}

/// The four ordered tracks of a timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    #[serde(default)]
    pub video: Vec<VideoEntry>,

    #[serde(default)]
    pub voiceover: Vec<VoiceEntry>,

    #[serde(default)]
    pub music: Vec<MusicEntry>,

    #[serde(default)]
    pub captions: Vec<CaptionEntry>,
}

/// One visual segment. `src` is `image:<url>` or an opaque label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    #[serde(default)]
    pub t0: f64,
    #[serde(default)]
    pub t1: f64,
    #[serde(default)]
    pub src: String,
}

/// One stretch of narration. Only its length matters to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    #[serde(default)]
    pub t0: f64,
    #[serde(default)]
    pub t1: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Background music hint. Music has no intrinsic timestamps; sliced
/// timelines carry a synthetic span covering the whole window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t1: Option<f64>,
}

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    #[serde(default)]
    pub t0: f64,
    #[serde(default)]
    pub t1: f64,
    #[serde(default)]
    pub text: String,
}

/// How a video entry should be sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSource<'a> {
    /// Remote still image to animate.
    Image { url: &'a str },
    /// Text label rendered over a solid background.
    Label { text: &'a str },
}

/// An entry with a `[t0, t1)` span.
pub trait Timed: Sized {
    fn span(&self) -> (f64, f64);

    /// Copy of the entry with a new span; every other field is kept.
    fn with_span(&self, t0: f64, t1: f64) -> Self;

    fn width(&self) -> f64 {
        let (t0, t1) = self.span();
        t1 - t0
    }
}

macro_rules! impl_timed {
    ($($ty:ty),*) => {
        $(
            impl Timed for $ty {
                fn span(&self) -> (f64, f64) {
                    (self.t0, self.t1)
                }

                fn with_span(&self, t0: f64, t1: f64) -> Self {
                    Self {
                        t0,
                        t1,
                        ..self.clone()
                    }
                }
            }
        )*
    };
}

impl_timed!(VideoEntry, VoiceEntry, CaptionEntry);

fn default_fps() -> u32 {
    DEFAULT_FPS
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            duration_seconds: None,
            fps: DEFAULT_FPS,
            tracks: Tracks::default(),
        }
    }
}

impl VideoEntry {
    pub fn new(t0: f64, t1: f64, src: impl Into<String>) -> Self {
        Self {
            t0,
            t1,
            src: src.into(),
        }
    }

    /// Classify `src`. The image marker is matched case-insensitively.
    pub fn source(&self) -> VideoSource<'_> {
        let src = self.src.trim();
        match src.get(..IMAGE_MARKER.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(IMAGE_MARKER) => VideoSource::Image {
                url: src[IMAGE_MARKER.len()..].trim(),
            },
            _ => VideoSource::Label { text: src },
        }
    }
}

impl CaptionEntry {
    pub fn new(t0: f64, t1: f64, text: impl Into<String>) -> Self {
        Self {
            t0,
            t1,
            text: text.into(),
        }
    }
}

impl Timeline {
    /// Declared duration when positive, otherwise the latest end time across
    /// time-bearing tracks. `None` when neither is known.
    pub fn effective_duration(&self) -> Option<f64> {
        if let Some(d) = self.duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
            return Some(d);
        }
        let latest = self
            .tracks
            .video
            .iter()
            .map(|e| e.t1)
            .chain(self.tracks.voiceover.iter().map(|e| e.t1))
            .chain(self.tracks.captions.iter().map(|e| e.t1))
            .filter(|t| t.is_finite())
            .fold(0.0f64, f64::max);
        (latest > 0.0).then_some(latest)
    }

    /// Total speech time: sum of positive voiceover widths.
    pub fn speech_duration(&self) -> f64 {
        self.tracks
            .voiceover
            .iter()
            .map(|e| e.width().max(0.0))
            .filter(|w| w.is_finite())
            .sum()
    }

    /// Voice requested by the first voiceover entry.
    pub fn voice(&self) -> Option<&str> {
        self.tracks.voiceover.first().and_then(|e| e.voice.as_deref())
    }

    pub fn has_music(&self) -> bool {
        !self.tracks.music.is_empty()
    }

    /// Ducking volume for the background bed.
    pub fn music_volume(&self) -> f64 {
        self.tracks
            .music
            .first()
            .and_then(|m| m.vol)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(DEFAULT_MUSIC_VOLUME)
    }

    /// Reject structurally unusable timelines.
    pub fn validate(&self) -> ClipResult<()> {
        if self.fps == 0 {
            return Err(ClipError::input("timeline fps must be positive"));
        }
        if let Some(d) = self.duration_seconds {
            if !d.is_finite() || d < 0.0 {
                return Err(ClipError::input(format!(
                    "timeline durationSeconds must be >= 0, got {d}"
                )));
            }
        }
        let spans = self
            .tracks
            .video
            .iter()
            .map(Timed::span)
            .chain(self.tracks.voiceover.iter().map(Timed::span))
            .chain(self.tracks.captions.iter().map(Timed::span));
        for (t0, t1) in spans {
            if !t0.is_finite() || !t1.is_finite() {
                return Err(ClipError::input("track entry times must be finite"));
            }
        }
        Ok(())
    }
}
