use clipline_timeline::{
    slice, CaptionEntry, SegmentSpec, SegmentWindow, Timed, Timeline, VideoEntry, VoiceEntry,
};
use proptest::prelude::*;

fn span_strategy() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..120.0, 0.0f64..30.0).prop_map(|(t0, width)| (t0, t0 + width))
}

fn timeline_strategy() -> impl Strategy<Value = Timeline> {
    (
        prop::collection::vec(span_strategy(), 0..8),
        prop::collection::vec(span_strategy(), 0..4),
        prop::collection::vec(span_strategy(), 0..8),
    )
        .prop_map(|(video, voice, captions)| {
            let mut timeline = Timeline::default();
            timeline.tracks.video = video
                .into_iter()
                .enumerate()
                .map(|(i, (t0, t1))| VideoEntry::new(t0, t1, format!("broll:clip {i}")))
                .collect();
            timeline.tracks.voiceover = voice
                .into_iter()
                .map(|(t0, t1)| VoiceEntry { t0, t1, voice: None })
                .collect();
            timeline.tracks.captions = captions
                .into_iter()
                .map(|(t0, t1)| CaptionEntry::new(t0, t1, "cue"))
                .collect();
            timeline
        })
}

fn assert_within_window<T: Timed>(entries: &[T], window: f64) {
    for entry in entries {
        let (t0, t1) = entry.span();
        assert!(t0 >= 0.0, "entry starts before zero: {t0}");
        assert!(t0 < t1, "entry is empty: [{t0}, {t1})");
        assert!(t1 <= window, "entry ends after window {window}: {t1}");
    }
}

proptest! {
    #[test]
    fn sliced_entries_stay_inside_window(
        timeline in timeline_strategy(),
        start in 0.0f64..100.0,
        width in 0.01f64..40.0,
    ) {
        let end = start + width;
        let sliced = slice(&timeline, start, end).unwrap();
        let window = end - start;

        assert_within_window(&sliced.tracks.video, window);
        assert_within_window(&sliced.tracks.voiceover, window);
        assert_within_window(&sliced.tracks.captions, window);
        prop_assert_eq!(sliced.duration_seconds, Some(window));
    }

    #[test]
    fn sliced_entries_come_from_overlapping_originals(
        timeline in timeline_strategy(),
        start in 0.0f64..100.0,
        width in 0.01f64..40.0,
    ) {
        let end = start + width;
        let sliced = slice(&timeline, start, end).unwrap();
        let overlapping = timeline
            .tracks
            .video
            .iter()
            .filter(|e| e.t0.max(start) < e.t1.min(end))
            .count();
        prop_assert!(sliced.tracks.video.len() <= overlapping);

        // Order and payload are preserved.
        let originals: Vec<_> = timeline.tracks.video.iter().map(|e| e.src.as_str()).collect();
        let mut cursor = 0;
        for entry in &sliced.tracks.video {
            let pos = originals[cursor..].iter().position(|s| *s == entry.src);
            prop_assert!(pos.is_some());
            cursor += pos.unwrap_or(0) + 1;
        }
    }

    #[test]
    fn segment_windows_never_overlap(index in 0i64..20, length in 2.0f64..15.0) {
        let spec = SegmentSpec { index, length };
        let next = SegmentSpec { index: index + 1, length };
        let a = SegmentWindow::compute(&spec, None).unwrap();
        let b = SegmentWindow::compute(&next, None).unwrap();
        prop_assert!(a.start >= 0.0);
        prop_assert!(a.end > a.start);
        prop_assert!((a.end - b.start).abs() < 1e-9);
    }
}
