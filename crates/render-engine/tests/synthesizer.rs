mod support;

use std::path::PathBuf;
use std::sync::Arc;

use clipline_common::error::ClipError;
use clipline_render_engine::clip::ClipOrigin;
use clipline_render_engine::synthesizer::SegmentSynthesizer;
use clipline_render_engine::{ImageFetcher, Scratch};
use clipline_timeline::VideoEntry;

use support::{init_tracing, Call, FailingFetcher, MockBackend, StubFetcher, VERTICAL};

fn synthesizer(backend: Arc<MockBackend>, fetcher: Arc<dyn ImageFetcher>) -> SegmentSynthesizer {
    init_tracing();
    SegmentSynthesizer::new(
        backend,
        fetcher,
        PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
        VERTICAL,
    )
}

#[tokio::test]
async fn image_entry_renders_zoom_motion() {
    let backend = Arc::new(MockBackend::default());
    let synth = synthesizer(backend.clone(), Arc::new(StubFetcher));
    let scratch = Scratch::new().unwrap();

    let entry = VideoEntry::new(0.0, 5.0, "image:https://example.com/a.jpg");
    let clip = synth.synthesize(0, &entry, &scratch).await.unwrap();

    assert_eq!(clip.origin(), ClipOrigin::Motion);
    assert_eq!(clip.duration_secs(), 5.0);
    assert_eq!(clip.size(), Some(VERTICAL));
    assert_eq!(
        backend.calls(),
        vec![Call::Zoom {
            size: VERTICAL,
            frames: 150
        }]
    );
}

#[tokio::test]
async fn failed_fetch_falls_back_to_generic_label() {
    let backend = Arc::new(MockBackend::default());
    let synth = synthesizer(backend.clone(), Arc::new(FailingFetcher));
    let scratch = Scratch::new().unwrap();

    let entry = VideoEntry::new(2.0, 6.0, "image:https://example.com/missing.jpg");
    let clip = synth.synthesize(3, &entry, &scratch).await.unwrap();

    assert_eq!(clip.origin(), ClipOrigin::Solid);
    assert_eq!(clip.duration_secs(), 4.0);
    assert_eq!(
        backend.solids(),
        vec![(VERTICAL, 4.0, Some("Scene".to_string()))]
    );
}

#[tokio::test]
async fn failed_zoom_falls_back_to_generic_label() {
    let backend = Arc::new(MockBackend {
        fail_zoom: true,
        ..MockBackend::default()
    });
    let synth = synthesizer(backend.clone(), Arc::new(StubFetcher));
    let scratch = Scratch::new().unwrap();

    let entry = VideoEntry::new(0.0, 5.0, "image:https://example.com/corrupt.jpg");
    let clip = synth.synthesize(1, &entry, &scratch).await.unwrap();

    assert_eq!(clip.origin(), ClipOrigin::Solid);
    assert_eq!(clip.duration_secs(), 5.0);
    assert_eq!(
        backend.calls(),
        vec![Call::Solid {
            size: VERTICAL,
            duration_secs: 5.0,
            text: Some("Scene".to_string()),
            out: clip.path().to_path_buf(),
        }]
    );
}

#[tokio::test]
async fn font_failure_falls_back_to_plain_solid() {
    let backend = Arc::new(MockBackend {
        fail_text: true,
        ..MockBackend::default()
    });
    let synth = synthesizer(backend.clone(), Arc::new(FailingFetcher));
    let scratch = Scratch::new().unwrap();

    let entry = VideoEntry::new(0.0, 7.5, "broll:<b>Markets</b> open");
    let clip = synth.synthesize(0, &entry, &scratch).await.unwrap();

    assert_eq!(clip.duration_secs(), 7.5);
    assert!(clip.path().exists());
    assert_eq!(backend.solids(), vec![(VERTICAL, 7.5, None)]);
}

#[tokio::test]
async fn image_fetch_and_font_failures_still_produce_a_clip() {
    let backend = Arc::new(MockBackend {
        fail_text: true,
        ..MockBackend::default()
    });
    let synth = synthesizer(backend.clone(), Arc::new(FailingFetcher));
    let scratch = Scratch::new().unwrap();

    let entry = VideoEntry::new(0.0, 1.0, "IMAGE:https://example.com/a.jpg");
    let clip = synth.synthesize(0, &entry, &scratch).await.unwrap();
    assert_eq!(clip.duration_secs(), 1.0);
    assert_eq!(backend.solids(), vec![(VERTICAL, 1.0, None)]);
}

#[tokio::test]
async fn degenerate_spans_get_default_and_minimum_durations() {
    let backend = Arc::new(MockBackend::default());
    let synth = synthesizer(backend.clone(), Arc::new(FailingFetcher));
    let scratch = Scratch::new().unwrap();

    let empty = synth
        .synthesize(0, &VideoEntry::new(5.0, 5.0, "broll:x"), &scratch)
        .await
        .unwrap();
    assert_eq!(empty.duration_secs(), 3.0);

    let tiny = synth
        .synthesize(1, &VideoEntry::new(5.0, 5.05, "broll:x"), &scratch)
        .await
        .unwrap();
    assert_eq!(tiny.duration_secs(), 0.2);
}

#[tokio::test]
async fn terminal_strategy_failure_propagates() {
    let backend = Arc::new(MockBackend {
        fail_solid: true,
        ..MockBackend::default()
    });
    let synth = synthesizer(backend, Arc::new(FailingFetcher));
    let scratch = Scratch::new().unwrap();

    let err = synth
        .synthesize(0, &VideoEntry::new(0.0, 2.0, "broll:x"), &scratch)
        .await
        .unwrap_err();
    assert!(matches!(err, ClipError::Backend { .. }));
    assert!(err.to_string().contains("color source failed"));
}
