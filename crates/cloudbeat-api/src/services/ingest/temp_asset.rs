//! Local buffer for an upload in flight.

use cloudbeat_storage::UploadReader;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// A temporary file owned by one ingestion.
///
/// [`close`](TempAsset::close) removes it and reports failures; dropping it
/// without closing still removes it.
pub struct TempAsset {
    path: TempPath,
    file: Option<File>,
    len: u64,
}

impl TempAsset {
    /// Create an empty asset in `dir`, or the system temp directory.
    pub async fn create(dir: Option<&Path>) -> std::io::Result<Self> {
        let dir: PathBuf = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("cloudbeat-upload-")
                .tempfile_in(dir)
        })
        .await
        .map_err(std::io::Error::other)??;

        let (file, path) = named.into_parts();
        Ok(Self {
            path,
            file: Some(File::from_std(file)),
            len: 0,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("temp asset already finished"))?;
        file.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Flush and stop accepting writes.
    pub async fn finish(&mut self) -> std::io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A fresh reader over the buffered bytes.
    pub async fn reader(&self) -> std::io::Result<UploadReader> {
        let file = File::open(&self.path).await?;
        Ok(Box::pin(file))
    }

    /// Remove the file now.
    pub fn close(self) {
        let Self { path, file, .. } = self;
        drop(file);
        let shown = path.display().to_string();
        if let Err(e) = path.close() {
            tracing::warn!(error = %e, path = %shown, "Failed to remove temporary upload file");
        }
    }
}
