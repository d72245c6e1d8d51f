use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod activity;
pub mod cache;
pub mod config;
pub mod github;
pub mod leetcode;
pub mod refresh;
pub mod resume;
pub mod spotify;

use activity::ActivityDay;
use cache::SourceCache;
use config::Config;
use github::GithubClient;
use leetcode::LeetCodeClient;
use spotify::{PlaybackStatus, SpotifyClient};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub spotify: SpotifyClient,
    pub leetcode: LeetCodeClient,
    pub github: GithubClient,
    pub playback_cache: Arc<SourceCache<PlaybackStatus>>,
    pub judge_cache: Arc<SourceCache<Vec<ActivityDay>>>,
    pub contribution_cache: Arc<SourceCache<Vec<ActivityDay>>>,
    pub resume_log_endpoint: Option<String>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .expect("failed to build http client");

        Self {
            spotify: SpotifyClient::new(http.clone(), config.spotify.clone()),
            leetcode: LeetCodeClient::new(http.clone(), config.leetcode_username.clone()),
            github: GithubClient::new(http.clone(), config.github_username.clone()),
            playback_cache: Arc::new(SourceCache::new("playback", config.playback_ttl)),
            judge_cache: Arc::new(SourceCache::new("judge-activity", config.activity_ttl)),
            contribution_cache: Arc::new(SourceCache::new(
                "contribution-activity",
                config.activity_ttl,
            )),
            resume_log_endpoint: config.resume_log_endpoint.clone(),
            http,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status/playback", get(get_playback))
        .route("/status/judge-activity", get(get_judge_activity))
        .route("/status/contribution-activity", get(get_contribution_activity))
        .route("/resume", get(resume::get_resume))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// Always 200; failures are encoded as `source: none` in the payload so the
/// site can render a last-known or empty state. Freshness matters here, so
/// HTTP-level caching is disabled.
#[axum::debug_handler]
async fn get_playback(State(state): State<AppState>) -> Response {
    let spotify = state.spotify.clone();
    let status = state
        .playback_cache
        .get_or_refresh(|| async move { spotify.playback_status().await })
        .await
        .unwrap_or_else(|| PlaybackStatus::unavailable("playback status unavailable"));

    (
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Json(status),
    )
        .into_response()
}

async fn get_judge_activity(State(state): State<AppState>) -> Json<Vec<ActivityDay>> {
    let leetcode = state.leetcode.clone();
    let days = state
        .judge_cache
        .get_or_refresh(|| async move { leetcode.submission_calendar().await })
        .await
        .unwrap_or_else(|| {
            tracing::warn!("judge activity unavailable, serving empty series");
            Vec::new()
        });
    Json(days)
}

async fn get_contribution_activity(State(state): State<AppState>) -> Json<Vec<ActivityDay>> {
    let github = state.github.clone();
    let days = state
        .contribution_cache
        .get_or_refresh(|| async move { github.contribution_calendar().await })
        .await
        .unwrap_or_else(|| {
            tracing::warn!("contribution activity unavailable, serving empty series");
            Vec::new()
        });
    Json(days)
}

pub async fn run() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("portfolio_status_api=debug,tower_http=debug")
        .init();

    let config = Config::from_env();
    if config.spotify.is_none() {
        tracing::warn!("spotify credentials not set, playback will report unavailable");
    }

    let state = AppState::new(&config);

    // Keeps the playback cache warm for the whole process lifetime.
    let _refresh = refresh::RefreshTask::spawn(state.clone(), config.playback_ttl);

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
