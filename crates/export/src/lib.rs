pub mod download;
pub mod qif;

pub use download::{DownloadError, Downloader, FileDownloader, SavedDownload};
pub use qif::{generate, QifError, QIF_EXTENSION, QIF_MIME};
