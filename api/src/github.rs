use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::activity::{build_series, ActivityDay};

const CONTRIBUTIONS_ENDPOINT: &str = "https://github-contributions-api.jogruber.de/v4";

#[derive(Debug, Deserialize)]
struct ContributionsResponse {
    #[serde(default)]
    contributions: Vec<Value>,
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    username: String,
}

impl GithubClient {
    pub fn new(http: Client, username: String) -> Self {
        Self { http, username }
    }

    /// Full contribution calendar for the configured user.
    pub async fn contribution_calendar(&self) -> Result<Vec<ActivityDay>> {
        let url = format!("{}/{}", CONTRIBUTIONS_ENDPOINT, self.username);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("contribution api unreachable")?;

        if !response.status().is_success() {
            anyhow::bail!("contribution api returned {}", response.status());
        }

        let body: ContributionsResponse = response
            .json()
            .await
            .context("malformed contribution response")?;

        if body.contributions.is_empty() {
            anyhow::bail!("empty contribution calendar for {}", self.username);
        }

        Ok(parse_contributions(body.contributions))
    }
}

/// The upstream ships its own per-day `level`, but it is recomputed here so
/// both activity sources quantize with the same rule. A bad entry is
/// skipped, never the whole series.
fn parse_contributions(entries: Vec<Value>) -> Vec<ActivityDay> {
    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(date) = entry.get("date").and_then(Value::as_str) else {
            tracing::debug!("skipping contribution entry without a date");
            continue;
        };
        let Some(count) = entry.get("count").and_then(Value::as_u64) else {
            tracing::debug!("skipping contribution entry with non-numeric count on {}", date);
            continue;
        };
        pairs.push((date.to_string(), count as u32));
    }
    build_series(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_levels_are_recomputed_locally() {
        // Upstream claims level 1 everywhere; the local rule disagrees.
        let entries = vec![
            json!({"date": "2026-01-01", "count": 0, "level": 1}),
            json!({"date": "2026-01-02", "count": 8, "level": 1}),
            json!({"date": "2026-01-03", "count": 2, "level": 1}),
        ];
        let days = parse_contributions(entries);
        let levels: Vec<u8> = days.iter().map(|d| d.level).collect();
        assert_eq!(levels, vec![0, 4, 1]);
    }

    #[test]
    fn test_malformed_entries_are_dropped_individually() {
        let entries = vec![
            json!({"date": "2026-01-01", "count": 4}),
            json!({"date": "2026-01-02", "count": "four"}),
            json!({"count": 2}),
            json!({"date": "2026-01-04", "count": 1}),
        ];
        let days = parse_contributions(entries);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2026-01-01");
        assert_eq!(days[1].date, "2026-01-04");
    }

    #[test]
    fn test_series_comes_back_sorted() {
        let entries = vec![
            json!({"date": "2026-02-01", "count": 1}),
            json!({"date": "2026-01-15", "count": 2}),
        ];
        let days = parse_contributions(entries);
        assert_eq!(days[0].date, "2026-01-15");
        assert_eq!(days[1].date, "2026-02-01");
    }
}
