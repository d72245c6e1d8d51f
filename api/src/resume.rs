use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::AppState;

const VIEW_LINK: &str = "https://drive.google.com/file/d/1ZTe3LT5xuc27A-FXvUr_zHr9NOKqUlUi/preview";
const DOWNLOAD_LINK: &str =
    "https://drive.google.com/uc?export=download&id=1ZTe3LT5xuc27A-FXvUr_zHr9NOKqUlUi";

const MOBILE_MARKERS: &[&str] = &[
    "android", "webos", "iphone", "ipad", "ipod", "blackberry", "iemobile", "opera mini",
];

#[derive(Debug, Deserialize)]
pub struct ResumeQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VisitRecord {
    timestamp: String,
    #[serde(rename = "type")]
    kind: String,
    user_agent: String,
    device_type: &'static str,
    ip: String,
    location: VisitLocation,
}

#[derive(Debug, Serialize)]
struct VisitLocation {
    city: String,
    country: String,
    region: String,
}

fn target_url(kind: &str) -> &'static str {
    if kind == "download" {
        DOWNLOAD_LINK
    } else {
        VIEW_LINK
    }
}

fn device_type(user_agent: &str) -> &'static str {
    let ua = user_agent.to_ascii_lowercase();
    if MOBILE_MARKERS.iter().any(|marker| ua.contains(marker)) {
        "Mobile"
    } else {
        "Desktop"
    }
}

fn header_or(headers: &HeaderMap, name: &str, fallback: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback)
        .to_string()
}

/// Redirects to the resume document and logs the visit in the background.
/// The redirect never waits on the log sink.
pub async fn get_resume(
    State(state): State<AppState>,
    Query(query): Query<ResumeQuery>,
    headers: HeaderMap,
) -> Redirect {
    let kind = query.kind.unwrap_or_else(|| "view".to_string());
    let target = target_url(&kind);

    if let Some(endpoint) = state.resume_log_endpoint.clone() {
        let user_agent = header_or(&headers, "user-agent", "unknown");
        let record = VisitRecord {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            device_type: device_type(&user_agent),
            user_agent,
            ip: header_or(&headers, "x-forwarded-for", "unknown"),
            location: VisitLocation {
                city: header_or(&headers, "x-vercel-ip-city", "Unknown"),
                country: header_or(&headers, "x-vercel-ip-country", "Unknown"),
                region: header_or(&headers, "x-vercel-ip-country-region", "Unknown"),
            },
        };

        let http = state.http.clone();
        tokio::spawn(async move {
            match http.post(&endpoint).json(&record).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("logged resume {} visit", record.kind);
                }
                Ok(response) => {
                    tracing::warn!("resume log sink returned {}", response.status());
                }
                Err(e) => {
                    tracing::warn!("resume log sink unreachable: {:#}", e);
                }
            }
        });
    }

    Redirect::temporary(target)
}
