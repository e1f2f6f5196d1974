//! Publishing finished artifacts to a retrievable location.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use clipline_common::error::{ClipError, ClipResult};

/// Makes a local file retrievable and returns its address.
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Publish `local` as `file_name` under the `request_id` namespace.
    async fn publish(&self, request_id: &str, local: &Path, file_name: &str)
        -> ClipResult<String>;
}

/// Copies artifacts into a directory served at `<base_url>/files/`.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    files_dir: PathBuf,
    base_url: String,
}

impl LocalPublisher {
    pub fn new(files_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            files_dir: files_dir.into(),
            base_url: base_url.into(),
        }
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// Public URL of a published file.
    pub fn url_for(&self, request_id: &str, file_name: &str) -> String {
        format!(
            "{}/files/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(request_id),
            urlencoding::encode(file_name)
        )
    }
}

#[async_trait]
impl ArtifactPublisher for LocalPublisher {
    async fn publish(
        &self,
        request_id: &str,
        local: &Path,
        file_name: &str,
    ) -> ClipResult<String> {
        check_name(request_id)?;
        check_name(file_name)?;

        if !local.exists() {
            return Err(ClipError::FileNotFound {
                path: local.to_path_buf(),
            });
        }

        let dir = self.files_dir.join(request_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ClipError::publish(format!("{}: {e}", dir.display())))?;
        let target = dir.join(file_name);
        let bytes = tokio::fs::copy(local, &target)
            .await
            .map_err(|e| ClipError::publish(format!("{}: {e}", target.display())))?;

        let url = self.url_for(request_id, file_name);
        tracing::info!(file = file_name, bytes, url = %url, "Published artifact");
        Ok(url)
    }
}

/// A single path component: no separators, not `.` or `..`.
fn check_name(name: &str) -> ClipResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\');
    if bad {
        return Err(ClipError::publish(format!("invalid artifact name '{name}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_encodes_name() {
        let publisher = LocalPublisher::new("/srv/files", "http://localhost:10000/");
        assert_eq!(
            publisher.url_for("abc", "video_final_9x16_7.5s.mp4"),
            "http://localhost:10000/files/abc/video_final_9x16_7.5s.mp4"
        );
        assert_eq!(
            publisher.url_for("abc", "my clip.mp4"),
            "http://localhost:10000/files/abc/my%20clip.mp4"
        );
    }

    #[tokio::test]
    async fn test_publish_copies_into_namespace() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("local.mp4");
        std::fs::write(&source, b"data").unwrap();

        let publisher = LocalPublisher::new(root.path().join("files"), "http://host");
        let url = publisher
            .publish("req-1", &source, "preview_10s_9x16.mp4")
            .await
            .unwrap();

        assert_eq!(url, "http://host/files/req-1/preview_10s_9x16.mp4");
        let copied = root.path().join("files/req-1/preview_10s_9x16.mp4");
        assert_eq!(std::fs::read(copied).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_publish_rejects_traversal_and_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("local.mp4");
        std::fs::write(&source, b"data").unwrap();
        let publisher = LocalPublisher::new(root.path(), "http://host");

        let err = publisher
            .publish("req", &source, "../escape.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::Publish { .. }));

        let err = publisher
            .publish("req", &root.path().join("gone.mp4"), "a.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::FileNotFound { .. }));
    }
}
