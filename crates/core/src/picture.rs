//! Profile picture loading.
//!
//! The picker scans a directory for image files; a chosen file is read
//! asynchronously and embedded as a `data:` URI, mirroring what a browser
//! file input would hand the form. Reads are bounded in size and time, and
//! failures are typed so the UI can surface them instead of hanging on a
//! read that never resolves.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use base64::Engine as _;
use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Picture shown on cards when nothing was uploaded.
pub const PLACEHOLDER_PICTURE_URL: &str = "https://placehold.co/80x80.png";

/// Upper bound for an embedded picture; data URIs blow up memory fast.
pub const MAX_PICTURE_BYTES: u64 = 5 * 1024 * 1024;

/// Why a picture could not be loaded.
#[derive(Debug, Error)]
pub enum PictureError {
    /// The extension is not one of the accepted image types.
    #[error("not a supported image type: {}", path.display())]
    UnsupportedType {
        /// Rejected file.
        path: PathBuf,
    },
    /// The file exceeds [`MAX_PICTURE_BYTES`].
    #[error("{} is {len} bytes; the picture limit is {limit}", path.display())]
    TooLarge {
        /// Rejected file.
        path: PathBuf,
        /// Actual size in bytes.
        len: u64,
        /// Effective limit in bytes.
        limit: u64,
    },
    /// The read did not finish within the configured window.
    #[error("timed out after {timeout:?} reading {}", path.display())]
    Timeout {
        /// File being read.
        path: PathBuf,
        /// Window that elapsed.
        timeout: Duration,
    },
    /// The underlying filesystem read failed.
    #[error("failed to read {}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Originating error.
        #[source]
        source: std::io::Error,
    },
}

/// A successfully embedded picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPicture {
    /// Source file.
    pub path: PathBuf,
    /// `data:<mime>;base64,…` payload ready for the contact record.
    pub data_uri: String,
    /// Size of the source file in bytes.
    pub len: u64,
}

/// An image file offered by the picker.
#[derive(Debug, Clone)]
pub struct PictureEntry {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File name shown in the picker list.
    pub file_name: String,
    /// Size in bytes.
    pub len: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Local>>,
}

/// MIME type for a path judged by its extension, or `None` for non-images.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Read an image file and embed it as a `data:` URI.
///
/// The read is bounded by [`MAX_PICTURE_BYTES`] and by `timeout`; once
/// started it is never cancelled by callers, so the result may arrive after
/// the form that requested it has already been submitted.
pub async fn load_data_uri(
    path: impl Into<PathBuf>,
    timeout: Duration,
) -> Result<LoadedPicture, PictureError> {
    load_bounded(path.into(), timeout, MAX_PICTURE_BYTES).await
}

async fn load_bounded(
    path: PathBuf,
    timeout: Duration,
    limit: u64,
) -> Result<LoadedPicture, PictureError> {
    let Some(mime) = mime_for_path(&path) else {
        return Err(PictureError::UnsupportedType { path });
    };

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|source| PictureError::Io {
            path: path.clone(),
            source,
        })?;
    let len = metadata.len();
    if len > limit {
        return Err(PictureError::TooLarge { path, len, limit });
    }

    let bytes = match tokio::time::timeout(timeout, tokio::fs::read(&path)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(source)) => return Err(PictureError::Io { path, source }),
        Err(_) => return Err(PictureError::Timeout { path, timeout }),
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(LoadedPicture {
        data_uri: format!("data:{mime};base64,{encoded}"),
        len: bytes.len() as u64,
        path,
    })
}

/// Enumerate image files under `root`, most recently modified first.
///
/// Hidden entries are skipped, as are files the walker cannot stat; a
/// missing root simply yields an empty list.
pub fn discover_pictures(root: impl AsRef<Path>, max_depth: usize) -> Vec<PictureEntry> {
    let root = root.as_ref();
    let mut entries = Vec::new();

    // depth 0 is the root itself, which may legitimately be a dot-directory
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || mime_for_path(entry.path()).is_none() {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("skipping {}: {err}", entry.path().display());
                continue;
            }
        };
        entries.push(PictureEntry {
            path: entry.path().to_path_buf(),
            file_name: entry.file_name().to_string_lossy().to_string(),
            len: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        });
    }

    entries.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    entries
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
