use clap::Parser;
use filekit::InvokerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server settings, read from flags or `FILEKIT_*` environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "filekit-api", version, about = "File conversion tools over HTTP")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "FILEKIT_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Base directory holding `uploads/` and `processed/`
    #[arg(long, env = "FILEKIT_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Media tool executable
    #[arg(long, env = "FILEKIT_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Maximum concurrent media tool processes
    #[arg(long, env = "FILEKIT_MAX_JOBS", default_value_t = 4)]
    pub max_jobs: usize,

    /// Answer 503 instead of queueing when every job slot is busy
    #[arg(long, env = "FILEKIT_REJECT_WHEN_BUSY")]
    pub reject_when_busy: bool,

    /// Kill media tool runs that exceed this many seconds
    #[arg(long, env = "FILEKIT_TOOL_TIMEOUT_SECS")]
    pub tool_timeout_secs: Option<u64>,

    /// Request body limit in megabytes
    #[arg(long, env = "FILEKIT_MAX_UPLOAD_MB", default_value_t = 512)]
    pub max_upload_mb: usize,
}

impl ServerConfig {
    /// Defaults rooted at `data_dir`, for embedding and tests.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            data_dir: data_dir.into(),
            ffmpeg: PathBuf::from("ffmpeg"),
            max_jobs: 4,
            reject_when_busy: false,
            tool_timeout_secs: None,
            max_upload_mb: 512,
        }
    }

    pub fn invoker_config(&self) -> InvokerConfig {
        InvokerConfig {
            program: self.ffmpeg.clone(),
            max_concurrent_jobs: self.max_jobs,
            reject_when_saturated: self.reject_when_busy,
            timeout: self.tool_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn body_limit(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
