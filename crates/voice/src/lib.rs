//! Clipline Voice
//!
//! Everything derived from the spoken side of a timeline:
//! - Speech planning. Synthesis is stubbed as silence of the narrated length.
//! - SubRip (`.srt`) caption files from the captions track.

pub mod speech;
pub mod subtitles;

pub use speech::*;
pub use subtitles::*;
