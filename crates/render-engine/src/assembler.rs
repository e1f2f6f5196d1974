//! Track assembly: the whole video track rendered to an ordered clip list.

use futures::stream::{self, StreamExt, TryStreamExt};

use clipline_common::error::ClipResult;
use clipline_timeline::VideoEntry;

use crate::clip::Clip;
use crate::scratch::Scratch;
use crate::synthesizer::{SegmentSynthesizer, DEFAULT_ENTRY_SECS, GENERIC_LABEL};

/// Entry rendered when the video track is empty.
pub fn placeholder_entry(duration_secs: f64) -> VideoEntry {
    VideoEntry::new(0.0, duration_secs, GENERIC_LABEL)
}

/// Runs the synthesizer over every video entry.
pub struct TrackAssembler<'a> {
    synthesizer: &'a SegmentSynthesizer,
    max_parallel: usize,
    placeholder_secs: f64,
}

impl<'a> TrackAssembler<'a> {
    pub fn new(synthesizer: &'a SegmentSynthesizer, max_parallel: usize) -> Self {
        Self {
            synthesizer,
            max_parallel: max_parallel.max(1),
            placeholder_secs: DEFAULT_ENTRY_SECS,
        }
    }

    /// Length of the placeholder rendered for an empty track.
    pub fn with_placeholder_secs(mut self, secs: f64) -> Self {
        self.placeholder_secs = secs;
        self
    }

    /// Render `entries` in track order. Up to `max_parallel` entries are
    /// synthesized at once; the result keeps input order.
    pub async fn assemble(&self, entries: &[VideoEntry], scratch: &Scratch) -> ClipResult<Vec<Clip>> {
        let placeholder;
        let entries = if entries.is_empty() {
            tracing::info!(
                duration_secs = self.placeholder_secs,
                "Video track is empty, rendering placeholder segment"
            );
            placeholder = [placeholder_entry(self.placeholder_secs)];
            &placeholder[..]
        } else {
            entries
        };

        tracing::info!(
            entries = entries.len(),
            max_parallel = self.max_parallel,
            size = %self.synthesizer.size(),
            "Assembling video track"
        );

        stream::iter(entries.iter().enumerate())
            .map(|(index, entry)| self.synthesizer.synthesize(index, entry, scratch))
            .buffered(self.max_parallel)
            .try_collect()
            .await
    }
}
