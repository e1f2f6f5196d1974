//! Output assembly: plan selection, stage sequencing and publishing.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use clipline_common::clock::StageClock;
use clipline_common::config::{FeatureFlags, ServiceConfig};
use clipline_common::error::{ClipError, ClipResult, ErrorBody};
use clipline_timeline::{
    format_secs, slice_window, Format, RenderMode, RenderRequest, RenderResult, SegmentMeta,
    SegmentWindow, Timeline, VideoEntry, VideoSource,
};
use clipline_voice::{save_srt, SpeechPlan, SPEECH_SAMPLE_RATE};

use crate::assembler::TrackAssembler;
use crate::backend::MediaBackend;
use crate::clip::{Clip, ClipOrigin, EncodingSignature};
use crate::compositor::AudioComposer;
use crate::concat::concat_clips;
use crate::fetch::{HttpImageFetcher, ImageFetcher};
use crate::ffmpeg::FfmpegBackend;
use crate::publish::{ArtifactPublisher, LocalPublisher};
use crate::scratch::Scratch;
use crate::synthesizer::{SegmentSynthesizer, DEFAULT_ENTRY_SECS};

/// Length of preview renders.
pub const PREVIEW_SECS: f64 = 10.0;

/// Thumbnail timestamps and names for final renders.
pub const THUMBNAILS: [(f64, &str); 3] = [
    (2.0, "thumb_A.jpg"),
    (5.0, "thumb_B.jpg"),
    (8.0, "thumb_C.jpg"),
];

/// Caption file name for final renders.
pub const CAPTIONS_FILE: &str = "captions.srt";

/// Label of the fast preview when the timeline has no text entry.
pub const PREVIEW_LABEL: &str = "Preview";

/// What a request will produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderPlan {
    /// One labeled solid clip, no track assembly.
    FastPreview,
    /// Every stage. `preview` trims the result to [`PREVIEW_SECS`].
    FullPipeline { preview: bool },
    /// Every stage over one window of the timeline.
    SegmentChunk { window: SegmentWindow },
}

impl RenderPlan {
    /// Pick the plan for `request` under the deployment's feature flags.
    pub fn choose(request: &RenderRequest, features: &FeatureFlags) -> ClipResult<Self> {
        match request.mode {
            RenderMode::Preview if !request.full_preview && features.quick_preview_enabled => {
                Ok(Self::FastPreview)
            }
            RenderMode::Preview => Ok(Self::FullPipeline { preview: true }),
            RenderMode::Final => Ok(Self::FullPipeline { preview: false }),
            RenderMode::Segment => {
                let spec = request
                    .segment
                    .as_ref()
                    .ok_or_else(|| ClipError::input("segment mode requires a 'segment' object"))?;
                let window = SegmentWindow::compute(spec, request.timeline.effective_duration())?;
                Ok(Self::SegmentChunk { window })
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FastPreview => "fast_preview",
            Self::FullPipeline { preview: true } => "full_preview",
            Self::FullPipeline { preview: false } => "final",
            Self::SegmentChunk { .. } => "segment",
        }
    }
}

/// Published name of a preview.
pub fn preview_file_name(format: Format) -> String {
    format!("preview_{}s_{}.mp4", format_secs(PREVIEW_SECS), format.tag())
}

/// Published name of a final render.
pub fn final_file_name(format: Format, duration_secs: f64) -> String {
    format!(
        "video_final_{}_{}s.mp4",
        format.tag(),
        format_secs(duration_secs)
    )
}

/// Published name of a segment chunk.
pub fn segment_file_name(window: &SegmentWindow, format: Format) -> String {
    format!(
        "segment_{}_{}s_{}.mp4",
        window.index,
        format_secs(window.length()),
        format.tag()
    )
}

/// Thumbnail timestamp `at` clamped into a clip of `duration_secs`.
pub fn clamp_thumbnail_time(at: f64, duration_secs: f64) -> f64 {
    at.min((duration_secs - 0.1).max(0.0))
}

/// Source text for the fast preview: the first label entry, if any.
pub fn preview_label(timeline: &Timeline) -> &str {
    timeline
        .tracks
        .video
        .iter()
        .find_map(|entry| match entry.source() {
            VideoSource::Label { text } if !text.is_empty() => Some(text),
            _ => None,
        })
        .unwrap_or(PREVIEW_LABEL)
}

/// Status and JSON body an HTTP layer should answer with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RenderResponse {
    fn success(result: &RenderResult) -> Self {
        match serde_json::to_value(result) {
            Ok(body) => Self { status: 200, body },
            Err(err) => Self::failure(&ClipError::from(err), false),
        }
    }

    fn failure(err: &ClipError, chunked: bool) -> Self {
        let body = ErrorBody::from_error(err, chunked);
        Self {
            status: err.status_code(),
            body: serde_json::json!({ "error": body.error, "detail": body.detail }),
        }
    }
}

/// Runs render requests against a media backend.
#[derive(Clone)]
pub struct Renderer {
    config: ServiceConfig,
    backend: Arc<dyn MediaBackend>,
    fetcher: Arc<dyn ImageFetcher>,
    publisher: Arc<dyn ArtifactPublisher>,
}

/// Per-request state shared by the stages.
struct RenderContext<'a> {
    request_id: String,
    scratch: Scratch,
    clock: StageClock,
    format: Format,
    synthesizer: SegmentSynthesizer,
    composer: AudioComposer<'a>,
}

impl Renderer {
    /// Production renderer: ffmpeg, HTTP image fetch, local publishing.
    pub fn new(config: ServiceConfig) -> ClipResult<Self> {
        let backend = Arc::new(FfmpegBackend::new(&config.ffmpeg_path));
        let fetcher = Arc::new(HttpImageFetcher::new(
            config.limits.image_fetch_timeout_secs,
            config.limits.max_image_bytes,
        )?);
        let publisher = Arc::new(LocalPublisher::new(
            config.files_dir.clone(),
            config.public_base_url.clone(),
        ));
        Ok(Self::with_parts(config, backend, fetcher, publisher))
    }

    pub fn with_parts(
        config: ServiceConfig,
        backend: Arc<dyn MediaBackend>,
        fetcher: Arc<dyn ImageFetcher>,
        publisher: Arc<dyn ArtifactPublisher>,
    ) -> Self {
        Self {
            config,
            backend,
            fetcher,
            publisher,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn MediaBackend {
        self.backend.as_ref()
    }

    /// Parse and render a raw request body, producing the HTTP-shaped answer.
    pub async fn handle(&self, body: &str) -> RenderResponse {
        let request = match RenderRequest::from_json(body) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected render request");
                return RenderResponse::failure(&err, false);
            }
        };
        match self.render(&request).await {
            Ok(result) => RenderResponse::success(&result),
            Err(err) => RenderResponse::failure(&err, request.is_chunked()),
        }
    }

    /// Render `request` under the configured deadline.
    pub async fn render(&self, request: &RenderRequest) -> ClipResult<RenderResult> {
        let plan = RenderPlan::choose(request, &self.config.features)?;
        let secs = self.config.limits.request_timeout_secs;

        tracing::info!(
            mode = ?request.mode,
            format = request.format.as_str(),
            plan = plan.name(),
            video_entries = request.timeline.tracks.video.len(),
            "Starting render"
        );

        let outcome =
            tokio::time::timeout(Duration::from_secs(secs), self.run(request, plan)).await;
        match outcome {
            Ok(Ok(result)) => {
                tracing::info!(
                    plan = plan.name(),
                    total_ms = result.timings.total_millis,
                    "Render complete"
                );
                Ok(result)
            }
            Ok(Err(err)) => {
                tracing::error!(plan = plan.name(), error = %err, "Render failed");
                Err(err)
            }
            Err(_) => {
                tracing::error!(plan = plan.name(), secs, "Render timed out");
                Err(ClipError::timeout("render", secs))
            }
        }
    }

    async fn run(&self, request: &RenderRequest, plan: RenderPlan) -> ClipResult<RenderResult> {
        let format = request.format;
        let mut ctx = self.context(format)?;
        let mut result = RenderResult::default();

        match plan {
            RenderPlan::FastPreview => {
                let clip = self.fast_preview(&mut ctx, &request.timeline).await?;
                let name = preview_file_name(format);
                result.preview_url = Some(self.publish(&mut ctx, &clip, &name).await?);
            }
            RenderPlan::FullPipeline { preview: true } => {
                let clip = self
                    .full_pipeline(&mut ctx, &request.timeline, DEFAULT_ENTRY_SECS)
                    .await?;
                let clip = self.trim(&mut ctx, clip, PREVIEW_SECS).await?;
                let name = preview_file_name(format);
                result.preview_url = Some(self.publish(&mut ctx, &clip, &name).await?);
            }
            RenderPlan::FullPipeline { preview: false } => {
                let clip = self
                    .full_pipeline(&mut ctx, &request.timeline, DEFAULT_ENTRY_SECS)
                    .await?;
                let duration = request
                    .timeline
                    .effective_duration()
                    .unwrap_or_else(|| clip.duration_secs());
                let name = final_file_name(format, duration);
                result.final_url = Some(self.publish(&mut ctx, &clip, &name).await?);
                if request.captions && self.config.features.captions_enabled {
                    result.captions_url = self.captions(&mut ctx, &request.timeline).await?;
                }
                result.thumbnail_urls = self.thumbnails(&mut ctx, &clip).await?;
            }
            RenderPlan::SegmentChunk { window } => {
                if window.truncated {
                    tracing::info!(
                        index = window.index,
                        requested = window.requested_length,
                        actual = window.length(),
                        "Last segment truncated to timeline end"
                    );
                }
                let sliced = plan_timeline(&plan, &request.timeline)?;
                let clip = self
                    .full_pipeline(&mut ctx, &sliced, window.length())
                    .await?;
                let name = segment_file_name(&window, format);
                result.final_url = Some(self.publish(&mut ctx, &clip, &name).await?);
                result.segment_meta = Some(SegmentMeta {
                    index: window.index,
                    start: window.start,
                    end: window.end,
                    length: window.length(),
                });
            }
        }

        result.timings = ctx.clock.finish();
        Ok(result)
    }

    fn context(&self, format: Format) -> ClipResult<RenderContext<'_>> {
        let scratch = Scratch::new()?;
        let synthesizer = SegmentSynthesizer::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.fetcher),
            self.config.font_path.clone(),
            format.dimensions(),
        );
        Ok(RenderContext {
            request_id: uuid::Uuid::new_v4().to_string(),
            scratch,
            clock: StageClock::start(),
            format,
            synthesizer,
            composer: AudioComposer::new(self.backend.as_ref(), SPEECH_SAMPLE_RATE),
        })
    }

    async fn fast_preview(&self, ctx: &mut RenderContext<'_>, timeline: &Timeline) -> ClipResult<Clip> {
        let entry = VideoEntry::new(0.0, PREVIEW_SECS, preview_label(timeline));
        let clip = ctx.synthesizer.synthesize(0, &entry, &ctx.scratch).await?;
        ctx.clock.lap("video");

        if !self.config.preview_audio {
            return Ok(clip);
        }

        let plan = SpeechPlan {
            duration_secs: PREVIEW_SECS,
            ..SpeechPlan::for_timeline(timeline)
        };
        let voice = ctx.composer.synthesize_voice(&plan, &ctx.scratch).await?;
        ctx.clock.lap("voice");
        let clip = ctx.composer.compose(clip, voice, None, &ctx.scratch).await?;
        ctx.clock.lap("audio");
        Ok(clip)
    }

    /// Voice, video track, concat and audio mix. An empty video track renders
    /// one placeholder of `placeholder_secs`.
    async fn full_pipeline(
        &self,
        ctx: &mut RenderContext<'_>,
        timeline: &Timeline,
        placeholder_secs: f64,
    ) -> ClipResult<Clip> {
        let plan = SpeechPlan::for_timeline(timeline);
        let voice = ctx.composer.synthesize_voice(&plan, &ctx.scratch).await?;
        ctx.clock.lap("voice");

        let assembler =
            TrackAssembler::new(&ctx.synthesizer, self.config.limits.max_parallel_clips)
                .with_placeholder_secs(placeholder_secs);
        let clips = assembler
            .assemble(&timeline.tracks.video, &ctx.scratch)
            .await?;
        ctx.clock.lap("video");

        let video = concat_clips(
            self.backend.as_ref(),
            clips,
            self.config.concat_policy,
            &ctx.scratch,
        )
        .await?;
        ctx.clock.lap("concat");

        let bed = (self.config.features.music_enabled && timeline.has_music())
            .then(|| timeline.music_volume());
        let clip = ctx.composer.compose(video, voice, bed, &ctx.scratch).await?;
        ctx.clock.lap("audio");
        Ok(clip)
    }

    async fn trim(&self, ctx: &mut RenderContext<'_>, clip: Clip, secs: f64) -> ClipResult<Clip> {
        let out = ctx.scratch.file("trimmed", "mp4");
        self.backend.trim(clip.path(), secs, &out).await?;
        ctx.clock.lap("trim");

        let signature = match clip.size() {
            Some(size) => EncodingSignature::video(ClipOrigin::Trimmed, size),
            None => EncodingSignature::audio(ClipOrigin::Trimmed),
        };
        Ok(Clip::new(out, clip.duration_secs().min(secs), signature))
    }

    async fn publish(&self, ctx: &mut RenderContext<'_>, clip: &Clip, name: &str) -> ClipResult<String> {
        let url = self.publish_file(ctx, clip.path(), name).await?;
        ctx.clock.lap("publish");
        Ok(url)
    }

    async fn publish_file(&self, ctx: &RenderContext<'_>, local: &Path, name: &str) -> ClipResult<String> {
        self.publisher.publish(&ctx.request_id, local, name).await
    }

    async fn captions(&self, ctx: &mut RenderContext<'_>, timeline: &Timeline) -> ClipResult<Option<String>> {
        let cues = &timeline.tracks.captions;
        if cues.is_empty() {
            return Ok(None);
        }
        let path = ctx.scratch.file("captions", "srt");
        save_srt(cues, &path).await?;
        let url = self.publish_file(ctx, &path, CAPTIONS_FILE).await?;
        ctx.clock.lap("captions");
        Ok(Some(url))
    }

    async fn thumbnails(&self, ctx: &mut RenderContext<'_>, clip: &Clip) -> ClipResult<Vec<String>> {
        let size = ctx.format.thumbnail_size();
        let mut urls = Vec::with_capacity(THUMBNAILS.len());
        for (at, name) in THUMBNAILS {
            let at = clamp_thumbnail_time(at, clip.duration_secs());
            let out = ctx.scratch.file("thumb", "jpg");
            self.backend.extract_frame(clip.path(), at, size, &out).await?;
            urls.push(self.publish_file(ctx, &out, name).await?);
        }
        ctx.clock.lap("thumbnails");
        Ok(urls)
    }
}

/// The timeline a plan renders: the request's own, or a slice of it.
pub fn plan_timeline<'t>(plan: &RenderPlan, timeline: &'t Timeline) -> ClipResult<Cow<'t, Timeline>> {
    match plan {
        RenderPlan::SegmentChunk { window } => slice_window(timeline, window).map(Cow::Owned),
        _ => Ok(Cow::Borrowed(timeline)),
    }
}
