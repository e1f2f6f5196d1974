//! Check system capabilities.

use clipline_common::config::ServiceConfig;
use clipline_render_engine::{FfmpegBackend, MediaBackend};

pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    println!("Clipline System Check");
    println!("{}", "=".repeat(50));

    let mut ok = true;

    match config.validate() {
        Ok(()) => println!("[OK] Configuration is valid"),
        Err(e) => {
            ok = false;
            println!("[FAIL] Configuration: {e}");
        }
    }

    let backend = FfmpegBackend::new(&config.ffmpeg_path);
    if backend.is_available().await {
        println!("[OK] ffmpeg: {}", backend.ffmpeg_path().display());
    } else {
        ok = false;
        println!(
            "[FAIL] ffmpeg not runnable at '{}' (set ffmpeg_path or CLIPLINE_FFMPEG)",
            config.ffmpeg_path
        );
    }

    if config.font_path.exists() {
        println!("[OK] Font: {}", config.font_path.display());
    } else {
        println!(
            "[WARN] Font missing: {} (labels render as plain backgrounds)",
            config.font_path.display()
        );
    }

    match files_dir_writable(&config) {
        Ok(()) => println!("[OK] Files directory: {}", config.files_dir.display()),
        Err(e) => {
            ok = false;
            println!("[FAIL] Files directory {}: {e}", config.files_dir.display());
        }
    }

    println!("     Public base URL: {}", config.public_base_url);
    println!(
        "     Features: quick_preview={} music={} captions={}",
        config.features.quick_preview_enabled,
        config.features.music_enabled,
        config.features.captions_enabled
    );

    println!();
    if ok {
        println!("All required capabilities are available. Clipline is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}

fn files_dir_writable(config: &ServiceConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.files_dir)?;
    tempfile::tempfile_in(&config.files_dir)?;
    Ok(())
}
