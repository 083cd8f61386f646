use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Refusing to save to {0:?}: filename must not contain a path")]
    InvalidFilename(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub path: PathBuf,
    pub content_type: String,
}

/// Saves generated text under a suggested filename.
pub trait Downloader {
    fn download(&self, filename: &str, mime: &str, content: &str)
        -> Result<SavedDownload, DownloadError>;
}

/// Text downloads are always UTF-8; say so unless the caller already did.
pub fn content_type(mime: &str) -> String {
    if mime.contains("charset") {
        mime.to_string()
    } else {
        format!("{mime};charset=utf-8")
    }
}

/// Writes downloads into a directory, creating it on first use.
pub struct FileDownloader {
    dir: PathBuf,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for FileDownloader {
    fn download(
        &self,
        filename: &str,
        mime: &str,
        content: &str,
    ) -> Result<SavedDownload, DownloadError> {
        let name = Path::new(filename);
        if filename.is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(DownloadError::InvalidFilename(filename.to_string()));
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, content)?;
        tracing::info!("Saved {} ({} bytes)", path.display(), content.len());

        Ok(SavedDownload {
            path,
            content_type: content_type(mime),
        })
    }
}
