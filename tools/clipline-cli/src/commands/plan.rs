//! Show what a request would render.

use std::path::PathBuf;

use clipline_common::config::ServiceConfig;
use clipline_render_engine::export::{plan_timeline, RenderPlan};
use clipline_render_engine::synthesizer::{entry_duration, plan_strategies};
use clipline_timeline::RenderRequest;

pub fn run(config: ServiceConfig, request: PathBuf) -> anyhow::Result<()> {
    let body = super::read_request(&request)?;
    let request = RenderRequest::from_json(&body).map_err(|e| anyhow::anyhow!("{e}"))?;
    let plan = RenderPlan::choose(&request, &config.features).map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Plan: {}", plan.name());
    println!("  Format: {} ({})", request.format.as_str(), request.format.dimensions());
    match request.timeline.effective_duration() {
        Some(d) => println!("  Duration: {d}s"),
        None => println!("  Duration: unknown"),
    }

    if let RenderPlan::SegmentChunk { window } = &plan {
        println!(
            "  Window: [{}, {}) length {}s{}",
            window.start,
            window.end,
            window.length(),
            if window.truncated { " (truncated)" } else { "" }
        );
    }

    if plan == RenderPlan::FastPreview {
        println!("  Fast preview: one labeled clip, no track assembly");
        return Ok(());
    }

    let timeline = plan_timeline(&plan, &request.timeline).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("  Video entries: {}", timeline.tracks.video.len());
    for (i, entry) in timeline.tracks.video.iter().enumerate() {
        let chain: Vec<_> = plan_strategies(entry).iter().map(|s| s.name()).collect();
        println!(
            "    #{i} [{:.3}, {:.3}) {:.3}s  {}",
            entry.t0,
            entry.t1,
            entry_duration(entry),
            chain.join(" -> ")
        );
    }
    println!(
        "  Music: {}",
        if config.features.music_enabled && timeline.has_music() {
            format!("bed at {}", timeline.music_volume())
        } else {
            "off".to_string()
        }
    );
    println!("  Captions: {}", timeline.tracks.captions.len());

    Ok(())
}
