//! Clipline Render Engine
//!
//! Turns a timeline into published media: previews, final composites,
//! segment chunks, thumbnails and caption files.
//!
//! # Pipeline Architecture
//!
//! ```text
//! RenderRequest ── RenderPlan::choose
//!                        │
//!          (segment) slice to window
//!                        │
//! voiceover ─────────────┼──────────────── silence (voice stub) ──┐
//!                        │                                        │
//! video track ── SegmentSynthesizer × N (image → text → solid)    │
//!                        │                                        │
//!                   concat (copy | re-encode)                     │
//!                        │                                        │
//! music ─────────────────┴──── AudioComposer (amix, normalize=0) ─┘
//!                                          │
//!                             trim (preview) / thumbnails + srt (final)
//!                                          │
//!                                          ▼
//!                                ArtifactPublisher ── URLs
//! ```

pub mod assembler;
pub mod backend;
pub mod clip;
pub mod compositor;
pub mod concat;
pub mod export;
pub mod fetch;
pub mod ffmpeg;
pub mod publish;
pub mod scratch;
pub mod synthesizer;

pub use backend::MediaBackend;
pub use clip::Clip;
pub use export::*;
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use ffmpeg::FfmpegBackend;
pub use publish::{ArtifactPublisher, LocalPublisher};
pub use scratch::Scratch;
