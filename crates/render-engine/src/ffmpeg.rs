//! ffmpeg implementation of [`MediaBackend`].
//!
//! Argument vectors are built by pure functions so they can be checked
//! without running ffmpeg; [`FfmpegBackend`] only writes side files (text,
//! concat lists) and spawns the process.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use clipline_common::error::{ClipError, ClipResult};
use clipline_timeline::FrameSize;

use crate::backend::{
    ConcatMode, MediaBackend, MuxSpec, SolidSpec, ZoomSpec, AUDIO_CODEC, OUTPUT_FPS,
    PIXEL_FORMAT, VIDEO_CODEC,
};

const AUDIO_BITRATE: &str = "192k";
const STDERR_TAIL_LINES: usize = 20;

/// Spawns ffmpeg for each media operation.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg_path: PathBuf,
}

impl FfmpegBackend {
    /// Resolve `ffmpeg` (a name looked up in PATH, or a path).
    pub fn new(ffmpeg: &str) -> Self {
        let ffmpeg_path = which::which(ffmpeg).unwrap_or_else(|_| PathBuf::from(ffmpeg));
        Self { ffmpeg_path }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    async fn run(&self, operation: &str, args: Vec<String>) -> ClipResult<()> {
        tracing::debug!(operation, args = ?args, "Running ffmpeg");
        let started = std::time::Instant::now();

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ClipError::backend(format!("Failed to start ffmpeg for {operation}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipError::backend(format!(
                "ffmpeg {operation} failed (status {}): {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        tracing::debug!(
            operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ffmpeg finished"
        );
        Ok(())
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn solid(&self, spec: &SolidSpec, out: &Path) -> ClipResult<()> {
        let text_file = match &spec.text {
            Some(overlay) => {
                if !overlay.font_path.exists() {
                    return Err(ClipError::backend(format!(
                        "font not available: {}",
                        overlay.font_path.display()
                    )));
                }
                let path = out.with_extension("txt");
                tokio::fs::write(&path, &overlay.text).await?;
                Some(path)
            }
            None => None,
        };
        self.run("solid", solid_args(spec, text_file.as_deref(), out))
            .await
    }

    async fn zoom_image(&self, spec: &ZoomSpec, out: &Path) -> ClipResult<()> {
        self.run("zoom", zoom_args(spec, out)).await
    }

    async fn concat(&self, inputs: &[&Path], mode: ConcatMode, out: &Path) -> ClipResult<()> {
        if inputs.is_empty() {
            return Err(ClipError::NoSegments);
        }
        let list = out.with_extension("concat.txt");
        tokio::fs::write(&list, concat_list(inputs)).await?;
        self.run("concat", concat_args(&list, mode, out)).await
    }

    async fn mux_audio(&self, spec: &MuxSpec, out: &Path) -> ClipResult<()> {
        self.run("mux", mux_args(spec, out)).await
    }

    async fn extract_frame(
        &self,
        input: &Path,
        at_secs: f64,
        size: FrameSize,
        out: &Path,
    ) -> ClipResult<()> {
        self.run("thumbnail", frame_args(input, at_secs, size, out))
            .await
    }

    async fn trim(&self, input: &Path, duration_secs: f64, out: &Path) -> ClipResult<()> {
        self.run("trim", trim_args(input, duration_secs, out)).await
    }

    async fn silence(&self, duration_secs: f64, sample_rate: u32, out: &Path) -> ClipResult<()> {
        self.run("silence", silence_args(duration_secs, sample_rate, out))
            .await
    }
}

fn base_args() -> Vec<String> {
    ["-y", "-hide_banner", "-loglevel", "error", "-nostdin"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn push<I, S>(args: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.extend(items.into_iter().map(Into::into));
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Seconds with millisecond precision, as ffmpeg expects them.
pub fn secs_arg(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}

/// Gain with at least one decimal: `1.0`, `0.35`.
pub fn gain_arg(gain: f64) -> String {
    let text = format!("{:.3}", gain.max(0.0));
    let trimmed = text.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

fn video_codec_args() -> Vec<String> {
    vec![
        "-c:v".to_string(),
        VIDEO_CODEC.to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-pix_fmt".to_string(),
        PIXEL_FORMAT.to_string(),
        "-r".to_string(),
        OUTPUT_FPS.to_string(),
    ]
}

/// Escape a value for use inside an ffmpeg filter option.
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | ':' | '\'' | ',' | ';' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// `drawtext` filter reading its text from `text_file`. Expansion is off so
/// `%` and `\` in labels are drawn literally.
pub fn drawtext_filter(overlay: &crate::backend::TextOverlay, text_file: &Path) -> String {
    format!(
        "drawtext=fontfile={}:textfile={}:expansion=none:fontcolor={}:fontsize={}:box=1:boxcolor={}:boxborderw=24:x=(w-text_w)/2:y=(h-text_h)/2",
        escape_filter_value(&overlay.font_path.to_string_lossy()),
        escape_filter_value(&text_file.to_string_lossy()),
        overlay.font_color,
        overlay.font_size,
        overlay.box_color,
    )
}

pub fn solid_args(spec: &SolidSpec, text_file: Option<&Path>, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        [
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "color=c={}:s={}:r={}:d={}",
                spec.color,
                spec.size,
                spec.fps,
                secs_arg(spec.duration_secs)
            ),
        ],
    );
    if let (Some(overlay), Some(text_file)) = (&spec.text, text_file) {
        push(&mut args, ["-vf".to_string(), drawtext_filter(overlay, text_file)]);
    }
    args.extend(video_codec_args());
    push(&mut args, ["-an".to_string(), path_arg(out)]);
    args
}

/// `zoompan` filter: zoom grows by `zoom_step` per frame up to `zoom_max`.
pub fn zoompan_filter(spec: &ZoomSpec) -> String {
    let FrameSize { width, height } = spec.size;
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height},\
         zoompan=z='min(zoom+{step},{max})':d={frames}:s={width}x{height}:fps={fps}",
        step = spec.zoom_step,
        max = spec.zoom_max,
        frames = spec.frames,
        fps = spec.fps,
    )
}

pub fn zoom_args(spec: &ZoomSpec, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        [
            "-i".to_string(),
            path_arg(&spec.image),
            "-vf".to_string(),
            zoompan_filter(spec),
            "-frames:v".to_string(),
            spec.frames.to_string(),
        ],
    );
    args.extend(video_codec_args());
    push(&mut args, ["-an".to_string(), path_arg(out)]);
    args
}

/// Concat demuxer list: one `file '<path>'` line per input.
pub fn concat_list(inputs: &[&Path]) -> String {
    inputs
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn concat_args(list: &Path, mode: ConcatMode, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        ["-f", "concat", "-safe", "0"].map(String::from),
    );
    push(&mut args, ["-i".to_string(), path_arg(list)]);
    match mode {
        ConcatMode::Copy => push(&mut args, ["-c", "copy"].map(String::from)),
        ConcatMode::Reencode => {
            args.extend(video_codec_args());
            args.push("-an".to_string());
        }
    }
    args.push(path_arg(out));
    args
}

/// Audio filter graph mixing voice at `voice_gain` with a bed at `bed_gain`.
/// Inputs are summed, not rescaled.
pub fn mix_filter(voice_gain: f64, bed_gain: f64) -> String {
    format!(
        "[1:a]volume={}[a1];[2:a]volume={}[a2];[a1][a2]amix=inputs=2:normalize=0[aout]",
        gain_arg(voice_gain),
        gain_arg(bed_gain)
    )
}

pub fn mux_args(spec: &MuxSpec, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        [
            "-i".to_string(),
            path_arg(&spec.video),
            "-i".to_string(),
            path_arg(&spec.voice),
        ],
    );
    match &spec.bed {
        Some(bed) => {
            push(
                &mut args,
                [
                    "-f".to_string(),
                    "lavfi".to_string(),
                    "-i".to_string(),
                    format!("anullsrc=r={}:cl=stereo", bed.sample_rate),
                    "-filter_complex".to_string(),
                    mix_filter(spec.voice_gain, bed.volume),
                    "-map".to_string(),
                    "0:v".to_string(),
                    "-map".to_string(),
                    "[aout]".to_string(),
                ],
            );
        }
        None => {
            push(&mut args, ["-map", "0:v", "-map", "1:a"].map(String::from));
            if (spec.voice_gain - 1.0).abs() > f64::EPSILON {
                push(
                    &mut args,
                    ["-af".to_string(), format!("volume={}", gain_arg(spec.voice_gain))],
                );
            }
        }
    }
    push(
        &mut args,
        [
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            AUDIO_CODEC.to_string(),
            "-b:a".to_string(),
            AUDIO_BITRATE.to_string(),
            "-t".to_string(),
            secs_arg(spec.duration_secs),
            "-movflags".to_string(),
            "+faststart".to_string(),
            path_arg(out),
        ],
    );
    args
}

pub fn frame_args(input: &Path, at_secs: f64, size: FrameSize, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        [
            "-ss".to_string(),
            secs_arg(at_secs),
            "-i".to_string(),
            path_arg(input),
            "-frames:v".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", size.width, size.height),
            "-q:v".to_string(),
            "2".to_string(),
            path_arg(out),
        ],
    );
    args
}

pub fn trim_args(input: &Path, duration_secs: f64, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        [
            "-i".to_string(),
            path_arg(input),
            "-t".to_string(),
            secs_arg(duration_secs),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            path_arg(out),
        ],
    );
    args
}

pub fn silence_args(duration_secs: f64, sample_rate: u32, out: &Path) -> Vec<String> {
    let mut args = base_args();
    push(
        &mut args,
        [
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!("anullsrc=r={sample_rate}:cl=stereo"),
            "-t".to_string(),
            secs_arg(duration_secs),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            path_arg(out),
        ],
    );
    args
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
