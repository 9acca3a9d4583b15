//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the job API
    pub api_base_url: String,
    /// Delay before polling again after an empty claim
    pub poll_interval: Duration,
    /// Upper bound for the idle backoff
    pub max_poll_interval: Duration,
    /// Side of the square video note, in pixels
    pub mask_size: u32,
    /// Where finished artifacts are written
    pub result_dir: PathBuf,
    /// Local video used as the source for every job
    pub test_video_path: Option<PathBuf>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Kill FFmpeg after this long
    pub ffmpeg_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            poll_interval: Duration::from_secs(2),
            max_poll_interval: Duration::from_secs(30),
            mask_size: 512,
            result_dir: std::env::temp_dir(),
            test_video_path: None,
            request_timeout: Duration::from_secs(10),
            ffmpeg_timeout: Duration::from_secs(600),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            poll_interval: env_secs("WORKER_POLL_INTERVAL").unwrap_or(defaults.poll_interval),
            max_poll_interval: env_secs("WORKER_MAX_POLL_INTERVAL")
                .unwrap_or(defaults.max_poll_interval),
            mask_size: std::env::var("WORKER_MASK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.mask_size),
            result_dir: std::env::var("WORKER_RESULT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.result_dir),
            test_video_path: std::env::var("WORKER_TEST_VIDEO_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            request_timeout: env_secs("WORKER_REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            ffmpeg_timeout: env_secs("WORKER_FFMPEG_TIMEOUT").unwrap_or(defaults.ffmpeg_timeout),
        }
    }
}

/// Read a duration given in (possibly fractional) seconds.
fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
