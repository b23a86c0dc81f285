use super::to_flags;
use crate::FilekitError;
use std::str::FromStr;

/// Output formats accepted by the convert tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Mp4,
    Webm,
    Mkv,
    Mov,
    Avi,
    Gif,
    Mp3,
    Wav,
    Aac,
    Flac,
    Ogg,
    M4a,
}

impl TargetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Mp4 => "mp4",
            TargetFormat::Webm => "webm",
            TargetFormat::Mkv => "mkv",
            TargetFormat::Mov => "mov",
            TargetFormat::Avi => "avi",
            TargetFormat::Gif => "gif",
            TargetFormat::Mp3 => "mp3",
            TargetFormat::Wav => "wav",
            TargetFormat::Aac => "aac",
            TargetFormat::Flac => "flac",
            TargetFormat::Ogg => "ogg",
            TargetFormat::M4a => "m4a",
        }
    }

    pub fn flags(self) -> Vec<String> {
        match self {
            TargetFormat::Mp4 | TargetFormat::Mov | TargetFormat::Mkv => {
                to_flags(&["-c:v", "libx264", "-c:a", "aac"])
            }
            TargetFormat::Webm => to_flags(&["-c:v", "libvpx-vp9", "-c:a", "libopus"]),
            TargetFormat::Avi => to_flags(&["-c:v", "mpeg4", "-c:a", "libmp3lame"]),
            TargetFormat::Gif => to_flags(&["-vf", "fps=10,scale=480:-1:flags=lanczos", "-loop", "0"]),
            TargetFormat::Mp3 => to_flags(&["-vn", "-c:a", "libmp3lame", "-q:a", "2"]),
            TargetFormat::Wav => to_flags(&["-vn", "-c:a", "pcm_s16le"]),
            TargetFormat::Aac | TargetFormat::M4a => to_flags(&["-vn", "-c:a", "aac", "-b:a", "192k"]),
            TargetFormat::Flac => to_flags(&["-vn", "-c:a", "flac"]),
            TargetFormat::Ogg => to_flags(&["-vn", "-c:a", "libvorbis", "-q:a", "5"]),
        }
    }
}

impl FromStr for TargetFormat {
    type Err = FilekitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        let format = match normalized.as_str() {
            "mp4" => TargetFormat::Mp4,
            "webm" => TargetFormat::Webm,
            "mkv" => TargetFormat::Mkv,
            "mov" => TargetFormat::Mov,
            "avi" => TargetFormat::Avi,
            "gif" => TargetFormat::Gif,
            "mp3" => TargetFormat::Mp3,
            "wav" => TargetFormat::Wav,
            "aac" => TargetFormat::Aac,
            "flac" => TargetFormat::Flac,
            "ogg" => TargetFormat::Ogg,
            "m4a" => TargetFormat::M4a,
            _ => return Err(FilekitError::invalid(format!("unsupported format '{}'", s.trim()))),
        };
        Ok(format)
    }
}
