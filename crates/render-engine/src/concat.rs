//! Joining clips into one continuous video.

use clipline_common::config::ConcatPolicy;
use clipline_common::error::{ClipError, ClipResult};

use crate::backend::{ConcatMode, MediaBackend};
use crate::clip::{Clip, ClipOrigin, EncodingSignature};
use crate::scratch::Scratch;

/// Whether stream-copy is safe for `clips`: every clip must share one signature.
pub fn uniform_signature(clips: &[Clip]) -> Option<EncodingSignature> {
    let first = clips.first()?.signature();
    clips
        .iter()
        .all(|c| c.signature() == first)
        .then_some(first)
}

/// Modes to try for `clips`, in order.
pub fn concat_modes(clips: &[Clip], policy: ConcatPolicy) -> Vec<ConcatMode> {
    match policy {
        ConcatPolicy::Reencode => vec![ConcatMode::Reencode],
        ConcatPolicy::Auto if uniform_signature(clips).is_some() => {
            vec![ConcatMode::Copy, ConcatMode::Reencode]
        }
        ConcatPolicy::Auto => vec![ConcatMode::Reencode],
    }
}

/// Join `clips` in order. A single clip is returned untouched.
pub async fn concat_clips(
    backend: &dyn MediaBackend,
    clips: Vec<Clip>,
    policy: ConcatPolicy,
    scratch: &Scratch,
) -> ClipResult<Clip> {
    if clips.is_empty() {
        return Err(ClipError::NoSegments);
    }
    if clips.len() == 1 {
        return clips.into_iter().next().ok_or(ClipError::NoSegments);
    }

    let duration: f64 = clips.iter().map(Clip::duration_secs).sum();
    let size = clips[0].size();
    let inputs: Vec<_> = clips.iter().map(Clip::path).collect();
    let modes = concat_modes(&clips, policy);

    let mut last_err = None;
    for mode in modes {
        let out = scratch.file("joined", "mp4");
        match backend.concat(&inputs, mode, &out).await {
            Ok(()) => {
                tracing::info!(
                    clips = clips.len(),
                    mode = ?mode,
                    duration_secs = duration,
                    "Concatenated segments"
                );
                let signature = match size {
                    Some(size) => EncodingSignature::video(ClipOrigin::Joined, size),
                    None => EncodingSignature::audio(ClipOrigin::Joined),
                };
                return Ok(Clip::new(out, duration, signature));
            }
            Err(err) if mode == ConcatMode::Copy => {
                tracing::warn!(error = %err, "Stream-copy concat failed, re-encoding");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or(ClipError::NoSegments))
}
