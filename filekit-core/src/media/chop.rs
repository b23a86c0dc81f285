use super::to_flags;
use crate::storage::{sanitize_stem, short_id};
use crate::{FilekitError, Result};
use std::path::{Path, PathBuf};

/// Flags splitting the input into stream-copied segments of `minutes` each.
pub fn segment_flags(minutes: u32) -> Result<Vec<String>> {
    if minutes == 0 {
        return Err(FilekitError::invalid("minutes must be a positive integer"));
    }
    let seconds = (u64::from(minutes) * 60).to_string();
    Ok(to_flags(&[
        "-f",
        "segment",
        "-segment_time",
        seconds.as_str(),
        "-c",
        "copy",
        "-reset_timestamps",
        "1",
        "-segment_start_number",
        "1",
    ]))
}

/// Where the segment muxer writes and how produced segments are found again.
#[derive(Debug, Clone)]
pub struct SegmentPlan {
    stem: String,
    prefix: String,
    extension: String,
    directory: PathBuf,
}

impl SegmentPlan {
    pub fn new(directory: &Path, source_name: &str, extension: &str) -> Self {
        let stem = sanitize_stem(source_name);
        Self {
            prefix: format!("{stem}_chopped_{}", short_id()),
            stem,
            extension: extension.to_string(),
            directory: directory.to_path_buf(),
        }
    }

    /// Output pattern passed to the tool, e.g. `talk_chopped_1a2b3c4d_part%03d.mp3`.
    pub fn pattern(&self) -> PathBuf {
        self.directory
            .join(format!("{}_part%03d.{}", self.prefix, self.extension))
    }

    /// Path of the ZIP bundling several segments.
    pub fn archive_path(&self) -> PathBuf {
        self.directory.join(format!("{}.zip", self.prefix))
    }

    /// Name of the `index`-th (0-based) segment inside the archive.
    pub fn entry_name(&self, index: usize) -> String {
        format!("{}_part{:03}.{}", self.stem, index + 1, self.extension)
    }

    /// Segments written by the tool, in order.
    pub fn collect_segments(&self) -> Result<Vec<PathBuf>> {
        let marker = format!("{}_part", self.prefix);
        let mut segments = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&marker) {
                segments.push(entry.path());
            }
        }
        segments.sort();
        Ok(segments)
    }
}
