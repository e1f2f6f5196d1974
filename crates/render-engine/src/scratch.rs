//! Per-request temporary file space.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use clipline_common::error::ClipResult;

/// A private temporary directory for one render request.
///
/// Every call to [`Scratch::file`] returns a fresh name, and the directory is
/// removed with everything in it when the `Scratch` is dropped, whichever path
/// the request took.
#[derive(Debug)]
pub struct Scratch {
    dir: tempfile::TempDir,
    counter: AtomicU64,
}

impl Scratch {
    /// Create a scratch directory under the system temp dir.
    pub fn new() -> ClipResult<Self> {
        Self::in_dir(&std::env::temp_dir())
    }

    /// Create a scratch directory under `base`.
    pub fn in_dir(base: &Path) -> ClipResult<Self> {
        std::fs::create_dir_all(base)?;
        let dir = tempfile::Builder::new().prefix("clipline-").tempdir_in(base)?;
        tracing::debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self {
            dir,
            counter: AtomicU64::new(0),
        })
    }

    /// Root of the scratch directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A unique path inside the scratch directory, e.g. `0007-segment.mp4`.
    pub fn file(&self, stem: &str, ext: &str) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let ext = ext.trim_start_matches('.');
        self.dir.path().join(format!("{n:04}-{stem}.{ext}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_file_names_are_unique() {
        let scratch = Scratch::new().unwrap();
        let names: HashSet<_> = (0..100).map(|_| scratch.file("segment", "mp4")).collect();
        assert_eq!(names.len(), 100);
        assert!(names.iter().all(|p| p.starts_with(scratch.root())));
    }

    #[test]
    fn test_extension_normalized() {
        let scratch = Scratch::new().unwrap();
        let path = scratch.file("voice", ".wav");
        assert!(path.to_string_lossy().ends_with("-voice.wav"));
    }

    #[test]
    fn test_two_scratches_do_not_collide() {
        let a = Scratch::new().unwrap();
        let b = Scratch::new().unwrap();
        assert_ne!(a.root(), b.root());
        assert_ne!(a.file("x", "mp4"), b.file("x", "mp4"));
    }

    #[test]
    fn test_directory_removed_on_drop() {
        let scratch = Scratch::new().unwrap();
        let root = scratch.root().to_path_buf();
        std::fs::write(scratch.file("junk", "txt"), b"x").unwrap();
        drop(scratch);
        assert!(!root.exists());
    }
}
