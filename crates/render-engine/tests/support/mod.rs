//! Scripted collaborators for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clipline_common::config::ServiceConfig;
use clipline_common::error::{ClipError, ClipResult};
use clipline_render_engine::backend::{ConcatMode, MediaBackend, MuxSpec, SolidSpec, ZoomSpec};
use clipline_render_engine::{ArtifactPublisher, ImageFetcher, Renderer, Scratch};
use clipline_timeline::FrameSize;

/// One recorded backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Solid {
        size: FrameSize,
        duration_secs: f64,
        text: Option<String>,
        out: PathBuf,
    },
    Zoom {
        size: FrameSize,
        frames: u64,
    },
    Concat {
        inputs: Vec<PathBuf>,
        mode: ConcatMode,
    },
    Mux(MuxSpec),
    Frame {
        at_secs: f64,
        size: FrameSize,
    },
    Trim {
        duration_secs: f64,
    },
    Silence {
        duration_secs: f64,
    },
}

/// Backend that writes stub files and records what it was asked to do.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    pub fail_text: bool,
    pub fail_solid: bool,
    pub fail_copy: bool,
    pub fail_reencode: bool,
    pub fail_zoom: bool,
    pub solid_delay: Option<Duration>,
    /// Extra delay for solids drawing a given label.
    pub label_delays: HashMap<String, Duration>,
}

impl MockBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn solids(&self) -> Vec<(FrameSize, f64, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Solid {
                    size,
                    duration_secs,
                    text,
                    ..
                } => Some((size, duration_secs, text)),
                _ => None,
            })
            .collect()
    }

    pub fn concats(&self) -> Vec<(Vec<PathBuf>, ConcatMode)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Concat { inputs, mode } => Some((inputs, mode)),
                _ => None,
            })
            .collect()
    }

    pub fn muxes(&self) -> Vec<MuxSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Mux(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    /// Labels in the order their clips finished.
    pub fn finished_labels(&self) -> Vec<String> {
        self.solids().into_iter().filter_map(|(_, _, text)| text).collect()
    }

    /// Label drawn into the clip written at `path`.
    pub fn label_of(&self, path: &Path) -> Option<String> {
        self.calls().into_iter().find_map(|c| match c {
            Call::Solid { text, out, .. } if out == path => text,
            _ => None,
        })
    }

    pub fn frames(&self) -> Vec<f64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Frame { at_secs, .. } => Some(at_secs),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn stub(out: &Path) -> ClipResult<()> {
        tokio::fs::write(out, b"stub").await?;
        Ok(())
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn solid(&self, spec: &SolidSpec, out: &Path) -> ClipResult<()> {
        if let Some(delay) = self.solid_delay {
            tokio::time::sleep(delay).await;
        }
        let label_delay = spec
            .text
            .as_ref()
            .and_then(|t| self.label_delays.get(&t.text));
        if let Some(delay) = label_delay {
            tokio::time::sleep(*delay).await;
        }
        if spec.text.is_some() && self.fail_text {
            return Err(ClipError::backend("drawtext: font not available"));
        }
        if self.fail_solid {
            return Err(ClipError::backend("color source failed"));
        }
        self.record(Call::Solid {
            size: spec.size,
            duration_secs: spec.duration_secs,
            text: spec.text.as_ref().map(|t| t.text.clone()),
            out: out.to_path_buf(),
        });
        Self::stub(out).await
    }

    async fn zoom_image(&self, spec: &ZoomSpec, out: &Path) -> ClipResult<()> {
        if self.fail_zoom {
            return Err(ClipError::backend("zoompan: invalid input image"));
        }
        self.record(Call::Zoom {
            size: spec.size,
            frames: spec.frames,
        });
        Self::stub(out).await
    }

    async fn concat(&self, inputs: &[&Path], mode: ConcatMode, out: &Path) -> ClipResult<()> {
        self.record(Call::Concat {
            inputs: inputs.iter().map(|p| p.to_path_buf()).collect(),
            mode,
        });
        let fail = match mode {
            ConcatMode::Copy => self.fail_copy,
            ConcatMode::Reencode => self.fail_reencode,
        };
        if fail {
            return Err(ClipError::backend(format!("concat {mode:?} failed")));
        }
        Self::stub(out).await
    }

    async fn mux_audio(&self, spec: &MuxSpec, out: &Path) -> ClipResult<()> {
        self.record(Call::Mux(spec.clone()));
        Self::stub(out).await
    }

    async fn extract_frame(
        &self,
        _input: &Path,
        at_secs: f64,
        size: FrameSize,
        out: &Path,
    ) -> ClipResult<()> {
        self.record(Call::Frame { at_secs, size });
        Self::stub(out).await
    }

    async fn trim(&self, _input: &Path, duration_secs: f64, out: &Path) -> ClipResult<()> {
        self.record(Call::Trim { duration_secs });
        Self::stub(out).await
    }

    async fn silence(&self, duration_secs: f64, _sample_rate: u32, out: &Path) -> ClipResult<()> {
        self.record(Call::Silence { duration_secs });
        Self::stub(out).await
    }
}

/// Fetcher whose downloads always fail.
pub struct FailingFetcher;

#[async_trait]
impl ImageFetcher for FailingFetcher {
    async fn fetch(&self, url: &str, _scratch: &Scratch) -> ClipResult<PathBuf> {
        Err(ClipError::fetch(format!("{url}: HTTP 404 Not Found")))
    }
}

/// Fetcher that writes a placeholder image.
pub struct StubFetcher;

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, _url: &str, scratch: &Scratch) -> ClipResult<PathBuf> {
        let path = scratch.file("image", "jpg");
        tokio::fs::write(&path, b"jpeg").await?;
        Ok(path)
    }
}

/// Publisher that records names and hands out `mem://` URLs.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    pub fn names(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn request_ids(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactPublisher for RecordingPublisher {
    async fn publish(
        &self,
        request_id: &str,
        local: &Path,
        file_name: &str,
    ) -> ClipResult<String> {
        assert!(local.exists(), "published file missing: {}", local.display());
        self.published
            .lock()
            .unwrap()
            .push((request_id.to_string(), file_name.to_string()));
        Ok(format!("mem://{request_id}/{file_name}"))
    }
}

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub publisher: Arc<RecordingPublisher>,
    pub renderer: Renderer,
}

pub fn harness(config: ServiceConfig, backend: MockBackend) -> Harness {
    harness_with_fetcher(config, backend, Arc::new(FailingFetcher))
}

pub fn harness_with_fetcher(
    config: ServiceConfig,
    backend: MockBackend,
    fetcher: Arc<dyn ImageFetcher>,
) -> Harness {
    init_tracing();
    let backend = Arc::new(backend);
    let publisher = Arc::new(RecordingPublisher::default());
    let renderer = Renderer::with_parts(config, backend.clone(), fetcher, publisher.clone());
    Harness {
        backend,
        publisher,
        renderer,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("clipline=debug")
        .with_test_writer()
        .try_init();
}

pub const VERTICAL: FrameSize = FrameSize {
    width: 1080,
    height: 1920,
};
