//! Subtitle generation in SRT format.

use std::path::Path;

use clipline_common::clock::secs_to_ms;
use clipline_common::error::ClipResult;
use clipline_timeline::CaptionEntry;

/// Generate SRT subtitle content from caption entries.
pub fn generate_srt(captions: &[CaptionEntry]) -> String {
    let mut output = String::new();

    for (i, caption) in captions.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(caption.t0),
            format_srt_time(caption.t1),
        ));
        output.push_str(&cue_text(&caption.text));
        output.push_str("\n\n");
    }

    output
}

/// Cue body with blank lines removed; a blank line ends an SRT block.
fn cue_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(secs: f64) -> String {
    let total_ms = secs_to_ms(secs);
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Write captions to an `.srt` file.
pub async fn save_srt(captions: &[CaptionEntry], path: &Path) -> ClipResult<()> {
    tokio::fs::write(path, generate_srt(captions)).await?;
    tracing::debug!(path = %path.display(), cues = captions.len(), "Wrote captions");
    Ok(())
}
