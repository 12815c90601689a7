//! Per-request file staging
//!
//! Layout: `<root>/<user_id>/<request_token>/`, where the request token is a
//! fresh uuid. Keying the staging area by request rather than only by user
//! means two concurrent messages from the same user never share paths, so
//! one request's cleanup cannot delete another's in-flight files.

use std::path::{Path, PathBuf};

use crate::Result;

/// Fixed output filename for the synthesized reply
pub const RESPONSE_FILENAME: &str = "response.mp3";

/// File staging manager rooted at a configured directory
#[derive(Debug, Clone)]
pub struct Staging {
    root: PathBuf,
}

impl Staging {
    /// Create a staging manager rooted at `root`
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Ensure the per-user directory exists (idempotent, creates parents)
    ///
    /// # Errors
    ///
    /// Returns error if directory creation fails
    pub async fn ensure_user_dir(&self, user_id: i64) -> Result<PathBuf> {
        let dir = self.root.join(user_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Allocate a request-scoped staging area for `user_id`
    ///
    /// # Errors
    ///
    /// Returns error if directory creation fails
    pub async fn begin(&self, user_id: i64, input_filename: &str) -> Result<RequestStaging> {
        let user_dir = self.ensure_user_dir(user_id).await?;
        let token = uuid::Uuid::new_v4().to_string();
        let dir = user_dir.join(&token);
        tokio::fs::create_dir_all(&dir).await?;

        Ok(RequestStaging {
            input: dir.join(input_filename),
            output: dir.join(RESPONSE_FILENAME),
            dir,
        })
    }
}

/// Staging area owned by a single in-flight request
#[derive(Debug)]
pub struct RequestStaging {
    dir: PathBuf,
    input: PathBuf,
    output: PathBuf,
}

impl RequestStaging {
    /// Local path for the downloaded input audio
    #[must_use]
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Local path for the synthesized reply audio
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Remove the request directory and everything in it, best-effort
    ///
    /// A directory that no longer exists is not an error.
    pub async fn cleanup(self) {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "staging cleanup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_dir_creation_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let staging = Staging::new(tmp.path().to_path_buf());

        let first = staging.ensure_user_dir(42).await.unwrap();
        let second = staging.ensure_user_dir(42).await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[tokio::test]
    async fn requests_get_distinct_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let staging = Staging::new(tmp.path().to_path_buf());

        let a = staging.begin(7, "voice_abc.ogg").await.unwrap();
        let b = staging.begin(7, "voice_abc.ogg").await.unwrap();

        assert_ne!(a.input_path(), b.input_path());
        assert!(a.input_path().ends_with("voice_abc.ogg"));
        assert!(a.output_path().ends_with(RESPONSE_FILENAME));

        a.cleanup().await;
        b.cleanup().await;
    }

    #[tokio::test]
    async fn cleanup_removes_files_and_tolerates_absence() {
        let tmp = tempfile::TempDir::new().unwrap();
        let staging = Staging::new(tmp.path().to_path_buf());

        let request = staging.begin(7, "audio_x.mp3").await.unwrap();
        tokio::fs::write(request.input_path(), b"data").await.unwrap();
        let input = request.input_path().to_path_buf();
        let output = request.output_path().to_path_buf();

        request.cleanup().await;
        assert!(!input.exists());
        assert!(!output.exists());

        // Cleaning a request whose directory is already gone is fine
        let request = staging.begin(7, "audio_x.mp3").await.unwrap();
        let dir = request.input_path().parent().unwrap().to_path_buf();
        tokio::fs::remove_dir_all(&dir).await.unwrap();
        request.cleanup().await;
    }
}
