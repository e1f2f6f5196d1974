//! Render a request.

use std::path::PathBuf;

use clipline_common::config::ServiceConfig;
use clipline_render_engine::Renderer;

pub async fn run(
    config: ServiceConfig,
    request: PathBuf,
    out_json: Option<PathBuf>,
) -> anyhow::Result<()> {
    let body = super::read_request(&request)?;
    let renderer = Renderer::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to set up renderer: {e}"))?;

    let response = renderer.handle(&body).await;
    let pretty = serde_json::to_string_pretty(&response.body)?;
    println!("{pretty}");

    if let Some(path) = out_json {
        std::fs::write(&path, &pretty)?;
        tracing::info!(path = %path.display(), "Wrote response body");
    }

    if response.status != 200 {
        anyhow::bail!("render failed (HTTP {})", response.status);
    }
    Ok(())
}
