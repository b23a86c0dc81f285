use super::to_flags;
use crate::FilekitError;
use std::fmt;
use std::str::FromStr;

/// Fixed three-point compression scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    Low,
    Medium,
    High,
}

/// Encoder settings for one [`CompressionLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionProfile {
    pub crf: u8,
    pub preset: &'static str,
    pub audio_bitrate: &'static str,
}

impl CompressionLevel {
    pub fn profile(self) -> CompressionProfile {
        match self {
            CompressionLevel::Low => CompressionProfile {
                crf: 23,
                preset: "fast",
                audio_bitrate: "192k",
            },
            CompressionLevel::Medium => CompressionProfile {
                crf: 28,
                preset: "medium",
                audio_bitrate: "128k",
            },
            CompressionLevel::High => CompressionProfile {
                crf: 32,
                preset: "slow",
                audio_bitrate: "96k",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = FilekitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            other => Err(FilekitError::invalid(format!(
                "invalid compression level '{other}' (expected low, medium or high)"
            ))),
        }
    }
}

/// Flags and output extension for compressing a file with `input_extension`.
pub fn compression_flags(level: CompressionLevel, input_extension: &str) -> (Vec<String>, String) {
    let profile = level.profile();

    if super::is_audio_extension(input_extension) {
        let flags = to_flags(&["-vn", "-b:a", profile.audio_bitrate]);
        return (flags, input_extension.to_ascii_lowercase());
    }

    let crf = profile.crf.to_string();
    let flags = to_flags(&[
        "-c:v",
        "libx264",
        "-crf",
        crf.as_str(),
        "-preset",
        profile.preset,
        "-c:a",
        "aac",
        "-b:a",
        "128k",
    ]);
    (flags, "mp4".to_string())
}
