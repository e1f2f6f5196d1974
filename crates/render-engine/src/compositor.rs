//! Audio composition: voice, plus an optional ducked bed, onto the video.
//!
//! ```text
//! joined.mp4 ─[0:v]──────────────────────────────── copy ──┐
//! voice.wav  ─[1:a]─ volume=1.0 ──┐                        ├─▶ muxed.mp4
//! anullsrc   ─[2:a]─ volume=duck ─┴─ amix(normalize=0) ────┘
//! ```
//!
//! Without a bed the voice is mapped straight through.

use clipline_common::error::{ClipError, ClipResult};
use clipline_voice::SpeechPlan;

use crate::backend::{BedSpec, MediaBackend, MuxSpec};
use crate::clip::{Clip, ClipOrigin, EncodingSignature};
use crate::scratch::Scratch;

/// Gain applied to the primary voice stream.
pub const VOICE_GAIN: f64 = 1.0;

/// Produces and attaches the audio side of a render.
pub struct AudioComposer<'a> {
    backend: &'a dyn MediaBackend,
    sample_rate: u32,
}

impl<'a> AudioComposer<'a> {
    pub fn new(backend: &'a dyn MediaBackend, sample_rate: u32) -> Self {
        Self {
            backend,
            sample_rate,
        }
    }

    /// Render the voice stand-in described by `plan`.
    pub async fn synthesize_voice(&self, plan: &SpeechPlan, scratch: &Scratch) -> ClipResult<Clip> {
        let out = scratch.file("voice", "wav");
        self.backend
            .silence(plan.duration_secs, plan.sample_rate, &out)
            .await?;
        tracing::debug!(
            voice = %plan.voice,
            duration_secs = plan.duration_secs,
            "Generated voice stream"
        );
        Ok(Clip::new(
            out,
            plan.duration_secs,
            EncodingSignature::audio(ClipOrigin::Voice),
        ))
    }

    /// Mux `voice` onto `video`. With `bed_volume` set, a silent bed is mixed
    /// under the voice at that gain. The result keeps the video's duration.
    pub async fn compose(
        &self,
        video: Clip,
        voice: Clip,
        bed_volume: Option<f64>,
        scratch: &Scratch,
    ) -> ClipResult<Clip> {
        let size = video.size().ok_or_else(|| {
            ClipError::backend(format!(
                "cannot mux audio onto {}: not a video clip",
                video.path().display()
            ))
        })?;

        let spec = MuxSpec {
            video: video.path().to_path_buf(),
            voice: voice.path().to_path_buf(),
            voice_gain: VOICE_GAIN,
            bed: bed_volume.map(|volume| BedSpec {
                volume,
                sample_rate: self.sample_rate,
            }),
            duration_secs: video.duration_secs(),
        };
        let out = scratch.file("muxed", "mp4");
        self.backend.mux_audio(&spec, &out).await?;

        tracing::info!(
            music = bed_volume.is_some(),
            bed_volume = bed_volume.unwrap_or_default(),
            duration_secs = video.duration_secs(),
            "Composed audio"
        );
        Ok(Clip::new(
            out,
            video.duration_secs(),
            EncodingSignature::video(ClipOrigin::Muxed, size),
        ))
    }
}
