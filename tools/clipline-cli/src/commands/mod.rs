pub mod check;
pub mod init_config;
pub mod plan;
pub mod render;

use std::io::Read;
use std::path::Path;

/// Read a request body from a file, or stdin for `-`.
pub fn read_request(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))
}
