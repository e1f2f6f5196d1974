//! Speech planning for the voiceover track.
//!
//! Text-to-speech is out of scope. The pipeline renders silence whose length
//! is the narrated time, so downstream muxing always has a voice stream.

use serde::{Deserialize, Serialize};

use clipline_timeline::Timeline;

/// Voice used when the timeline does not name one.
pub const DEFAULT_VOICE: &str = "BR-M1";

/// Silence length used when the voiceover track is empty.
pub const DEFAULT_SPEECH_SECS: f64 = 10.0;

/// Sample rate of the generated voice stream.
pub const SPEECH_SAMPLE_RATE: u32 = 48_000;

/// What the voice stage has to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechPlan {
    pub voice: String,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

impl SpeechPlan {
    /// Plan the voice stream for a timeline.
    pub fn for_timeline(timeline: &Timeline) -> Self {
        let spoken = timeline.speech_duration();
        let duration_secs = if spoken > 0.0 {
            spoken
        } else {
            DEFAULT_SPEECH_SECS
        };
        let voice = timeline.voice().unwrap_or(DEFAULT_VOICE).to_string();

        tracing::debug!(
            voice = %voice,
            duration_secs,
            entries = timeline.tracks.voiceover.len(),
            "Planned voice stream"
        );

        Self {
            voice,
            duration_secs,
            sample_rate: SPEECH_SAMPLE_RATE,
        }
    }
}
