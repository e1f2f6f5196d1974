//! Clipline Timeline Model
//!
//! Defines the data contracts of the render pipeline:
//! - **Timeline:** Tracks of timed entries (video, voiceover, music, captions)
//! - **Request:** Render mode, output format, and segment parameters
//! - **Result:** Published artifact URLs and timing diagnostics
//! - **Slice:** Pure time arithmetic for segment windows and sub-range timelines
//!
//! All times are in seconds relative to the start of the timeline.

pub mod request;
pub mod slice;
pub mod timeline;

pub use request::*;
pub use slice::*;
pub use timeline::*;
