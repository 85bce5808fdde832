use std::env;
use std::time::Duration;

/// Runtime settings read from the environment (and an optional `.env` file)
#[derive(Debug, Clone)]
pub struct Config {
    pub provider_url: String,
    pub ffmpeg_path: String,
    pub timeout: Duration,
}

impl Config {
    pub const DEFAULT_PROVIDER_URL: &'static str = "https://query1.finance.yahoo.com";
    pub const DEFAULT_FFMPEG: &'static str = "ffmpeg";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Self {
        Self {
            provider_url: env::var("TICKER_ANIM_PROVIDER_URL")
                .unwrap_or_else(|_| Self::DEFAULT_PROVIDER_URL.to_string()),
            ffmpeg_path: env::var("TICKER_ANIM_FFMPEG")
                .unwrap_or_else(|_| Self::DEFAULT_FFMPEG.to_string()),
            timeout: Duration::from_secs(
                env::var("TICKER_ANIM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(Self::DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_url: Self::DEFAULT_PROVIDER_URL.to_string(),
            ffmpeg_path: Self::DEFAULT_FFMPEG.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}
