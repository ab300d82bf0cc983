use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Upload ceiling enforced by the body limit layer.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Sampling temperature for mood text generation.
pub const MOOD_TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub detector_url: String,
    pub detector_backend: String,
    pub llm_url: String,
    pub llm_model: String,
    pub http_timeout: Duration,
    pub session_ttl: Duration,
    pub upload_dir: PathBuf,
    pub font_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind = env::var("MOODLENS_BIND").ok().and_then(|v| v.parse().ok()).unwrap_or(IpAddr::from([127, 0, 0, 1]));
        let port = env::var("MOODLENS_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5000);
        let detector_url = env::var("MOODLENS_DETECTOR_URL").unwrap_or_else(|_| "http://127.0.0.1:5005".to_string());
        let detector_backend = env::var("MOODLENS_DETECTOR_BACKEND").unwrap_or_else(|_| "retinaface".to_string());
        let llm_url = env::var("MOODLENS_LLM_URL").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
        let llm_model = env::var("MOODLENS_LLM_MODEL").unwrap_or_else(|_| "gemma3:1b".to_string());
        let http_timeout = env::var("MOODLENS_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(120);
        let session_ttl = env::var("MOODLENS_SESSION_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(86_400);
        let upload_dir = env::var("MOODLENS_UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|_| env::temp_dir());
        let font_path = env::var("MOODLENS_FONT_PATH").ok().filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            bind,
            port,
            detector_url: detector_url.trim_end_matches('/').to_string(),
            detector_backend,
            llm_url: llm_url.trim_end_matches('/').to_string(),
            llm_model,
            http_timeout: Duration::from_secs(http_timeout),
            session_ttl: Duration::from_secs(session_ttl),
            upload_dir,
            font_path,
        }
    }
}
