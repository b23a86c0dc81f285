//! ZIP bundles for tasks that produce several outputs.

use crate::Result;
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A file on disk and the name it gets inside the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub path: PathBuf,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Build a ZIP in memory from named buffers, in the given order.
pub fn archive_bytes<N: AsRef<str>>(entries: &[(N, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(name.as_ref(), options())?;
        zip.write_all(bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Write `entries` into a new archive at `archive_path`, then delete the
/// entry files. Nothing is deleted if the archive cannot be written.
pub fn bundle_files(archive_path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    if let Err(err) = write_archive(archive_path, entries) {
        let _ = std::fs::remove_file(archive_path);
        return Err(err);
    }

    for entry in entries {
        if let Err(err) = std::fs::remove_file(&entry.path) {
            warn!(path = %entry.path.display(), error = %err, "failed to remove bundled file");
        }
    }
    debug!(archive = %archive_path.display(), entries = entries.len(), "bundled outputs");
    Ok(())
}

fn write_archive(archive_path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(archive_path)?);
    for entry in entries {
        zip.start_file(entry.name.as_str(), options())?;
        copy_into(&mut zip, &entry.path)?;
    }
    zip.finish()?;
    Ok(())
}

fn copy_into<W: Write + Seek>(zip: &mut ZipWriter<W>, path: &Path) -> Result<()> {
    let mut file = File::open(path)?;
    std::io::copy(&mut file, zip)?;
    Ok(())
}
