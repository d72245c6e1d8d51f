use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::activity::{build_series, ActivityDay};

const GRAPHQL_ENDPOINT: &str = "https://leetcode.com/graphql";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<DataBody>,
}

#[derive(Debug, Deserialize)]
struct DataBody {
    #[serde(rename = "matchedUser")]
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
struct MatchedUser {
    #[serde(rename = "submissionCalendar")]
    submission_calendar: Option<String>,
}

#[derive(Clone)]
pub struct LeetCodeClient {
    http: Client,
    username: String,
}

impl LeetCodeClient {
    pub fn new(http: Client, username: String) -> Self {
        Self { http, username }
    }

    /// Full submission calendar for the configured user, quantized for the
    /// heatmap and sorted by date.
    pub async fn submission_calendar(&self) -> Result<Vec<ActivityDay>> {
        let query = format!(
            r#"query {{ matchedUser(username: "{}") {{ submissionCalendar }} }}"#,
            self.username
        );

        let response = self
            .http
            .post(GRAPHQL_ENDPOINT)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .context("leetcode graphql endpoint unreachable")?;

        if !response.status().is_success() {
            anyhow::bail!("leetcode graphql returned {}", response.status());
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .context("malformed leetcode response")?;

        let calendar = body
            .data
            .and_then(|data| data.matched_user)
            .and_then(|user| user.submission_calendar)
            .ok_or_else(|| anyhow::anyhow!("no submission calendar for {}", self.username))?;

        parse_calendar(&calendar)
    }
}

/// The calendar arrives as a JSON string mapping unix-timestamp strings to
/// submission counts. A bad entry is skipped, never the whole series.
fn parse_calendar(raw: &str) -> Result<Vec<ActivityDay>> {
    let entries: HashMap<String, Value> =
        serde_json::from_str(raw).context("submission calendar is not a JSON object")?;

    let mut pairs = Vec::with_capacity(entries.len());
    for (timestamp, count) in entries {
        let Ok(seconds) = timestamp.parse::<i64>() else {
            tracing::debug!("skipping calendar entry with bad timestamp: {}", timestamp);
            continue;
        };
        let Some(count) = count.as_u64() else {
            tracing::debug!("skipping calendar entry with non-numeric count at {}", timestamp);
            continue;
        };
        let Some(moment) = chrono::DateTime::from_timestamp(seconds, 0) else {
            tracing::debug!("skipping calendar entry with out-of-range timestamp: {}", seconds);
            continue;
        };

        let date = moment.date_naive().format("%Y-%m-%d").to_string();
        pairs.push((date, count as u32));
    }

    Ok(build_series(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_is_parsed_and_sorted() {
        let raw = r#"{"172800": 5, "86400": 10, "259200": 0}"#;
        let days = parse_calendar(raw).unwrap();

        let dates: Vec<&str> = days.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["1970-01-02", "1970-01-03", "1970-01-04"]);

        let levels: Vec<u8> = days.iter().map(|d| d.level).collect();
        assert_eq!(levels, vec![4, 2, 0]);
    }

    #[test]
    fn test_malformed_entries_are_dropped_individually() {
        let raw = r#"{"86400": 3, "not-a-timestamp": 2, "172800": "oops", "259200": 1}"#;
        let days = parse_calendar(raw).unwrap();
        assert_eq!(days.len(), 2);
        assert!(days.iter().all(|d| d.count > 0));
    }

    #[test]
    fn test_non_object_calendar_is_an_error() {
        assert!(parse_calendar("[1, 2, 3]").is_err());
        assert!(parse_calendar("garbage").is_err());
    }

    #[test]
    fn test_empty_calendar_is_valid() {
        assert!(parse_calendar("{}").unwrap().is_empty());
    }
}
