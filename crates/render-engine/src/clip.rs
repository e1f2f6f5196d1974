//! Clip handles passed between pipeline stages.
//!
//! A [`Clip`] is not `Clone`: each stage takes the clips it consumes by value,
//! so a clip has exactly one owner at a time.

use std::path::{Path, PathBuf};

use clipline_timeline::FrameSize;

/// Which operation produced a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipOrigin {
    /// Zoom motion over a still image.
    Motion,
    /// Solid background, with or without text.
    Solid,
    /// Generated voice track (audio only).
    Voice,
    /// Output of the concatenator.
    Joined,
    /// Video with audio attached.
    Muxed,
    /// Shortened copy of another clip.
    Trimmed,
}

/// Encoding parameters relevant to stream-level joining. Clips with equal
/// signatures can be concatenated without re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingSignature {
    pub origin: ClipOrigin,
    pub size: Option<FrameSize>,
}

/// A locally produced media file and its duration.
#[derive(Debug)]
pub struct Clip {
    path: PathBuf,
    duration_secs: f64,
    signature: EncodingSignature,
}

impl EncodingSignature {
    pub fn video(origin: ClipOrigin, size: FrameSize) -> Self {
        Self {
            origin,
            size: Some(size),
        }
    }

    pub fn audio(origin: ClipOrigin) -> Self {
        Self { origin, size: None }
    }
}

impl Clip {
    pub fn new(path: PathBuf, duration_secs: f64, signature: EncodingSignature) -> Self {
        Self {
            path,
            duration_secs,
            signature,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn signature(&self) -> EncodingSignature {
        self.signature
    }

    pub fn origin(&self) -> ClipOrigin {
        self.signature.origin
    }

    pub fn size(&self) -> Option<FrameSize> {
        self.signature.size
    }
}
