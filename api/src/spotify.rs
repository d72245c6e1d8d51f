use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SpotifyCredentials;

const TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";
const NOW_PLAYING_ENDPOINT: &str = "https://api.spotify.com/v1/me/player/currently-playing";
const RECENTLY_PLAYED_ENDPOINT: &str = "https://api.spotify.com/v1/me/player/recently-played?limit=1";

/// Provenance of a playback status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaySource {
    /// Currently playing or paused-but-active session.
    Live,
    /// Most recent completed play.
    History,
    /// No data at all.
    None,
}

/// Normalized playback status served to the site.
///
/// `progressMs`/`durationMs` are only meaningful for a live item and are
/// forced to zero for history and none results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub is_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub source: PlaySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlaybackStatus {
    pub fn none() -> Self {
        Self {
            is_playing: false,
            title: None,
            artist: None,
            album_image_url: None,
            song_url: None,
            preview_url: None,
            progress_ms: 0,
            duration_ms: 0,
            source: PlaySource::None,
            error: None,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            error: Some(reason.to_string()),
            ..Self::none()
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NowPlayingPayload {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    album: Option<AlbumRef>,
    external_urls: Option<ExternalUrls>,
    preview_url: Option<String>,
    duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumRef {
    #[serde(default)]
    images: Vec<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentlyPlayedPayload {
    #[serde(default)]
    items: Vec<RecentItem>,
}

#[derive(Debug, Deserialize)]
struct RecentItem {
    track: TrackItem,
}

fn status_from_item(item: TrackItem, source: PlaySource) -> PlaybackStatus {
    let artist = if item.artists.is_empty() {
        None
    } else {
        Some(
            item.artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    PlaybackStatus {
        is_playing: false,
        title: Some(item.name),
        artist,
        album_image_url: item
            .album
            .and_then(|album| album.images.into_iter().next())
            .map(|image| image.url),
        song_url: item.external_urls.and_then(|urls| urls.spotify),
        preview_url: item.preview_url,
        progress_ms: 0,
        duration_ms: 0,
        source,
        error: None,
    }
}

/// An item returned by currently-playing is live whether playing or paused;
/// only `isPlaying` reflects the upstream flag.
fn live_status(payload: NowPlayingPayload) -> Option<PlaybackStatus> {
    let is_playing = payload.is_playing;
    let progress_ms = payload.progress_ms.unwrap_or(0);
    let item = payload.item?;
    let duration_ms = item.duration_ms.unwrap_or(0);

    let mut status = status_from_item(item, PlaySource::Live);
    status.is_playing = is_playing;
    status.progress_ms = progress_ms;
    status.duration_ms = duration_ms;
    Some(status)
}

fn history_status(item: TrackItem) -> PlaybackStatus {
    status_from_item(item, PlaySource::History)
}

#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    credentials: Option<SpotifyCredentials>,
}

impl SpotifyClient {
    pub fn new(http: Client, credentials: Option<SpotifyCredentials>) -> Self {
        Self { http, credentials }
    }

    /// Produces one playback status via the fallback chain:
    /// currently-playing, then recently-played, then `source: none`.
    ///
    /// Returns `Err` only when the upstream could not be consulted at all
    /// (failed token exchange, or a transport error left unresolved by the
    /// fallback), so the cache layer can serve the last good value. Missing
    /// credentials and a genuinely idle account are ordinary values.
    pub async fn playback_status(&self) -> Result<PlaybackStatus> {
        let Some(creds) = self.credentials.as_ref() else {
            return Ok(PlaybackStatus::unavailable("spotify credentials not configured"));
        };

        let token = self
            .exchange_token(creds)
            .await
            .context("token exchange failed")?;

        let mut primary_error = None;
        match self.fetch_now_playing(&token).await {
            Ok(Some(payload)) => {
                if let Some(status) = live_status(payload) {
                    return Ok(status);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("currently-playing fetch failed, trying recently-played: {:#}", e);
                primary_error = Some(e);
            }
        }

        match self.fetch_recently_played(&token).await {
            Ok(Some(track)) => Ok(history_status(track)),
            // Empty history after a failed primary: the failure may have
            // hidden an active session, so report it instead of "none".
            Ok(None) => match primary_error {
                Some(e) => Err(e),
                None => Ok(PlaybackStatus::none()),
            },
            Err(e) => Err(e),
        }
    }

    async fn exchange_token(&self, creds: &SpotifyCredentials) -> Result<String> {
        let auth = format!("{}:{}", creds.client_id, creds.client_secret);
        let encoded = general_purpose::STANDARD.encode(auth.as_bytes());

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .header("Authorization", format!("Basic {}", encoded))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &creds.refresh_token),
            ])
            .send()
            .await
            .context("token endpoint unreachable")?;

        if !response.status().is_success() {
            anyhow::bail!("token endpoint returned {}", response.status());
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("malformed token response")?;

        token.access_token.ok_or_else(|| {
            anyhow::anyhow!(
                "no access token in response: {} {}",
                token.error.unwrap_or_default(),
                token.error_description.unwrap_or_default()
            )
        })
    }

    async fn fetch_now_playing(&self, token: &str) -> Result<Option<NowPlayingPayload>> {
        let response = self
            .http
            .get(NOW_PLAYING_ENDPOINT)
            .bearer_auth(token)
            .send()
            .await
            .context("currently-playing endpoint unreachable")?;

        // 204 means no active session; error statuses fall through to the
        // recently-played leg rather than aborting the chain.
        if response.status() == StatusCode::NO_CONTENT || !response.status().is_success() {
            return Ok(None);
        }

        let payload = response
            .json()
            .await
            .context("malformed currently-playing body")?;
        Ok(Some(payload))
    }

    async fn fetch_recently_played(&self, token: &str) -> Result<Option<TrackItem>> {
        let response = self
            .http
            .get(RECENTLY_PLAYED_ENDPOINT)
            .bearer_auth(token)
            .send()
            .await
            .context("recently-played endpoint unreachable")?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let payload: RecentlyPlayedPayload = response
            .json()
            .await
            .context("malformed recently-played body")?;
        Ok(payload.items.into_iter().next().map(|item| item.track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> TrackItem {
        TrackItem {
            name: name.to_string(),
            artists: vec![
                ArtistRef {
                    name: "Artist A".to_string(),
                },
                ArtistRef {
                    name: "Artist B".to_string(),
                },
            ],
            album: Some(AlbumRef {
                images: vec![ImageRef {
                    url: "https://images.example/cover.jpg".to_string(),
                }],
            }),
            external_urls: Some(ExternalUrls {
                spotify: Some("https://open.spotify.com/track/abc".to_string()),
            }),
            preview_url: None,
            duration_ms: Some(215_000),
        }
    }

    #[test]
    fn test_live_status_maps_all_fields() {
        let payload = NowPlayingPayload {
            is_playing: true,
            progress_ms: Some(42_000),
            item: Some(track("Song")),
        };

        let status = live_status(payload).unwrap();
        assert_eq!(status.source, PlaySource::Live);
        assert!(status.is_playing);
        assert_eq!(status.title.as_deref(), Some("Song"));
        assert_eq!(status.artist.as_deref(), Some("Artist A, Artist B"));
        assert_eq!(status.progress_ms, 42_000);
        assert_eq!(status.duration_ms, 215_000);
        assert_eq!(
            status.song_url.as_deref(),
            Some("https://open.spotify.com/track/abc")
        );
    }

    #[test]
    fn test_paused_item_is_still_live() {
        let payload = NowPlayingPayload {
            is_playing: false,
            progress_ms: Some(10_000),
            item: Some(track("Paused Song")),
        };

        let status = live_status(payload).unwrap();
        assert_eq!(status.source, PlaySource::Live);
        assert!(!status.is_playing);
    }

    #[test]
    fn test_empty_live_payload_yields_nothing() {
        let payload = NowPlayingPayload {
            is_playing: false,
            progress_ms: None,
            item: None,
        };
        assert!(live_status(payload).is_none());
    }

    #[test]
    fn test_history_status_zeroes_progress_fields() {
        let status = history_status(track("Old Song"));
        assert_eq!(status.source, PlaySource::History);
        assert!(!status.is_playing);
        assert_eq!(status.progress_ms, 0);
        assert_eq!(status.duration_ms, 0);
        assert_eq!(status.title.as_deref(), Some("Old Song"));
    }

    #[test]
    fn test_none_status_carries_no_track_fields() {
        let status = PlaybackStatus::none();
        assert_eq!(status.source, PlaySource::None);
        assert!(!status.is_playing);
        assert!(status.title.is_none());
        assert_eq!(status.progress_ms, 0);
        assert_eq!(status.duration_ms, 0);
    }

    #[test]
    fn test_wire_shape_is_camel_case_and_sparse() {
        let value = serde_json::to_value(PlaybackStatus::none()).unwrap();
        assert_eq!(value["isPlaying"], serde_json::json!(false));
        assert_eq!(value["source"], serde_json::json!("none"));
        assert!(value.get("title").is_none());
        assert!(value.get("albumImageUrl").is_none());

        let live = live_status(NowPlayingPayload {
            is_playing: true,
            progress_ms: Some(1),
            item: Some(track("Song")),
        })
        .unwrap();
        let value = serde_json::to_value(live).unwrap();
        assert_eq!(value["source"], serde_json::json!("live"));
        assert_eq!(value["progressMs"], serde_json::json!(1));
        assert_eq!(value["durationMs"], serde_json::json!(215_000));
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuit() {
        let client = SpotifyClient::new(Client::new(), None);
        let status = client.playback_status().await.unwrap();
        assert_eq!(status.source, PlaySource::None);
        assert!(!status.is_playing);
        assert!(status.error.is_some());
    }
}
