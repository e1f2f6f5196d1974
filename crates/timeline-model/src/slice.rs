//! Time arithmetic: segment windows and sub-range timelines.
//!
//! Sliced timelines are always zero-based: every retained entry is clipped
//! to the window and shifted by `-t0`.

use clipline_common::error::{ClipError, ClipResult};

use crate::request::{SegmentSpec, MAX_SEGMENT_SECS, MIN_SEGMENT_SECS};
use crate::timeline::{MusicEntry, Timed, Timeline, Tracks};

/// A `[start, end)` chunk of the timeline selected by a [`SegmentSpec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub index: u64,
    pub start: f64,
    pub end: f64,

    /// Length after clamping to the accepted range.
    pub requested_length: f64,

    /// Whether the window was shortened to fit the known duration.
    pub truncated: bool,
}

impl SegmentWindow {
    /// Compute the window for `spec` against an optional known duration.
    ///
    /// With a known `total`, the last chunk is cut at `total`. Without one the
    /// chunk is always the full requested length.
    pub fn compute(spec: &SegmentSpec, total: Option<f64>) -> ClipResult<Self> {
        if spec.index < 0 {
            return Err(ClipError::input(format!(
                "segment index must be >= 0, got {}",
                spec.index
            )));
        }
        if !spec.length.is_finite() || spec.length <= 0.0 {
            return Err(ClipError::input(format!(
                "segment length must be > 0, got {}",
                spec.length
            )));
        }

        let index = spec.index as u64;
        let length = spec.length.clamp(MIN_SEGMENT_SECS, MAX_SEGMENT_SECS);
        let start = index as f64 * length;
        let unbounded_end = start + length;
        let end = match total.filter(|t| t.is_finite() && *t > 0.0) {
            Some(total) => total.min(unbounded_end),
            None => unbounded_end,
        };

        if end <= start {
            return Err(ClipError::input(format!(
                "segment {index} starts at {start}s, past the end of the timeline"
            )));
        }

        Ok(Self {
            index,
            start,
            end,
            requested_length: length,
            truncated: end < unbounded_end,
        })
    }

    /// Actual window length.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Intersect `span` with `[t0, t1)` and shift it to be relative to `t0`.
/// Returns `None` when nothing of positive width remains.
pub fn clip_span(span: (f64, f64), t0: f64, t1: f64) -> Option<(f64, f64)> {
    let start = span.0.max(t0);
    let end = span.1.min(t1);
    if !(end > start) {
        return None;
    }
    let shifted = (start - t0, end - t0);
    (shifted.1 > shifted.0).then_some(shifted)
}

fn slice_track<T: Timed>(entries: &[T], t0: f64, t1: f64) -> Vec<T> {
    entries
        .iter()
        .filter_map(|e| clip_span(e.span(), t0, t1).map(|(a, b)| e.with_span(a, b)))
        .collect()
}

/// Restrict `timeline` to `[t0, t1)`.
///
/// Music is not time-sliced: a non-empty music track becomes one entry
/// spanning the whole window, keeping the first entry's volume hint.
pub fn slice(timeline: &Timeline, t0: f64, t1: f64) -> ClipResult<Timeline> {
    if !t0.is_finite() || !t1.is_finite() || t0 < 0.0 {
        return Err(ClipError::input(format!(
            "invalid slice bounds [{t0}, {t1})"
        )));
    }
    if t1 <= t0 {
        return Err(ClipError::input(format!(
            "empty slice window [{t0}, {t1})"
        )));
    }

    let duration = t1 - t0;
    let music = match timeline.tracks.music.first() {
        Some(first) => vec![MusicEntry {
            vol: first.vol,
            t0: Some(0.0),
            t1: Some(duration),
        }],
        None => Vec::new(),
    };

    Ok(Timeline {
        duration_seconds: Some(duration),
        fps: timeline.fps,
        tracks: Tracks {
            video: slice_track(&timeline.tracks.video, t0, t1),
            voiceover: slice_track(&timeline.tracks.voiceover, t0, t1),
            music,
            captions: slice_track(&timeline.tracks.captions, t0, t1),
        },
    })
}

/// Slice the timeline to a segment window.
pub fn slice_window(timeline: &Timeline, window: &SegmentWindow) -> ClipResult<Timeline> {
    slice(timeline, window.start, window.end)
}
