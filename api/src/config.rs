use std::str::FromStr;
use std::time::Duration;

/// Spotify credentials for the refresh-token grant.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl SpotifyCredentials {
    /// All three values must be present and non-empty after trimming,
    /// otherwise the playback source is treated as not configured.
    pub fn from_parts(
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            client_id: non_empty(client_id)?,
            client_secret: non_empty(client_secret)?,
            refresh_token: non_empty(refresh_token)?,
        })
    }

    pub fn from_env() -> Option<Self> {
        Self::from_parts(
            std::env::var("SPOTIFY_CLIENT_ID").ok(),
            std::env::var("SPOTIFY_CLIENT_SECRET").ok(),
            std::env::var("SPOTIFY_REFRESH_TOKEN").ok(),
        )
    }
}

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub spotify: Option<SpotifyCredentials>,
    pub leetcode_username: String,
    pub github_username: String,
    pub playback_ttl: Duration,
    pub activity_ttl: Duration,
    pub resume_log_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 3001),
            spotify: SpotifyCredentials::from_env(),
            leetcode_username: env_or_str("LEETCODE_USERNAME", "pranavgawai"),
            github_username: env_or_str("GITHUB_USERNAME", "pranavgawaii"),
            playback_ttl: Duration::from_secs(env_or("PLAYBACK_CACHE_SECS", 5)),
            activity_ttl: Duration::from_secs(env_or("ACTIVITY_CACHE_SECS", 3600)),
            resume_log_endpoint: non_empty(std::env::var("RESUME_LOG_ENDPOINT").ok()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn env_or_str(key: &str, default: &str) -> String {
    non_empty(std::env::var(key).ok()).unwrap_or_else(|| default.to_string())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
