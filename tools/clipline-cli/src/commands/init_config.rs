//! Write a default configuration file.

use std::path::PathBuf;

use clipline_common::config::{config_file_path, ServiceConfig};

pub fn run(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let target = path.unwrap_or_else(config_file_path);
    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let config = ServiceConfig::default();
    let written = config.save(Some(target.as_path()))?;

    println!("Wrote default configuration to {}", written.display());
    println!("  files_dir: {}", config.files_dir.display());
    println!("  public_base_url: {}", config.public_base_url);
    println!("  ffmpeg_path: {}", config.ffmpeg_path);
    println!("  font_path: {}", config.font_path.display());

    Ok(())
}
