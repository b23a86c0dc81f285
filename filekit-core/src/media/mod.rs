//! Argument builders for media tasks run through the [`crate::invoker`].
//!
//! Each task turns validated request parameters into the flag list placed
//! between the input and the output path, plus the extension of the output.

pub mod chop;
pub mod compress;
pub mod convert;

pub use chop::{segment_flags, SegmentPlan};
pub use compress::{compression_flags, CompressionLevel, CompressionProfile};
pub use convert::TargetFormat;

/// Extensions treated as audio-only input.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac", "ogg", "opus", "wma"];

/// Extension sniffing for audio input.
pub fn is_audio_extension(extension: &str) -> bool {
    AUDIO_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

pub(crate) fn to_flags(flags: &[&str]) -> Vec<String> {
    flags.iter().map(|f| f.to_string()).collect()
}
