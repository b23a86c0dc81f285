//! Transient storage for uploads and processed outputs.
//!
//! Two flat directories live under a base path: `uploads/` for request inputs
//! and `processed/` for results waiting to be downloaded. Names are made
//! unique with random identifiers; nothing is locked.

use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const UPLOADS_DIR: &str = "uploads";
const PROCESSED_DIR: &str = "processed";
const MAX_STEM_LEN: usize = 64;

/// Create `path` (and its parents) unless it already exists.
pub async fn ensure_directory(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        return Ok(());
    }
    debug!(path = %path.display(), "creating storage directory");
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TransientStorage {
    uploads: PathBuf,
    processed: PathBuf,
}

impl TransientStorage {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            uploads: base.join(UPLOADS_DIR),
            processed: base.join(PROCESSED_DIR),
        }
    }

    /// Ensure both directories exist.
    pub async fn prepare(&self) -> Result<()> {
        ensure_directory(&self.uploads).await?;
        ensure_directory(&self.processed).await
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed
    }

    /// Write an uploaded file under a generated name, keeping its extension.
    ///
    /// The returned guard removes the file when dropped.
    pub async fn persist_upload(&self, file_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
        let extension = extension_of(file_name).unwrap_or_else(|| "bin".to_string());
        let path = self
            .uploads
            .join(format!("{}.{extension}", Uuid::new_v4().simple()));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "persisted upload");

        Ok(StoredUpload {
            path,
            original_name: file_name.to_string(),
            extension,
        })
    }

    /// Path for a new processed output: `<stem>_<task>_<id8>.<extension>`.
    pub fn output_path(&self, source_name: &str, task: &str, extension: &str) -> PathBuf {
        self.processed.join(format!(
            "{}_{task}_{}.{extension}",
            sanitize_stem(source_name),
            short_id()
        ))
    }

    /// Resolve a client-supplied download name inside `processed/`.
    ///
    /// Only the final path component is honoured, so `../../etc/passwd`
    /// resolves to `processed/passwd`.
    pub fn resolve_download(&self, requested: &str) -> Option<PathBuf> {
        let name = base_name(requested)?;
        Some(self.processed.join(name))
    }

    pub fn download_url(path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("/api/download?file={name}")
    }
}

/// An uploaded input owned by a single request.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    original_name: String,
    extension: String,
}

impl StoredUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Lower-cased extension of the original file name (`bin` when absent).
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "failed to remove upload");
            }
        }
    }
}

/// Random 8-hex-digit identifier used in output names.
pub fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Reduce a client file name to a safe stem of `[A-Za-z0-9_-]`.
pub fn sanitize_stem(file_name: &str) -> String {
    let name = base_name(file_name).unwrap_or("");
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let mut out = String::with_capacity(stem.len());
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
        if out.len() >= MAX_STEM_LEN {
            break;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-cased extension of `file_name`, restricted to ASCII alphanumerics.
pub fn extension_of(file_name: &str) -> Option<String> {
    let name = base_name(file_name)?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn base_name(requested: &str) -> Option<&str> {
    let name = requested.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}
