//! Client for the WakaTime API. Authenticates with the user's secret API key.

pub mod entities;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use entities::{ErrorEntity, SummariesResponse, UserResponse};
use reqwest::header::AUTHORIZATION;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::{
    error::Vendor,
    http,
    report::{DailySummary, WeekWindow},
    utils::time::format_query_date,
};

pub const DEFAULT_BASE_URL: &str = "https://wakatime.com/api/v1";

/// Source of daily coding activity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeTracker: Send + Sync {
    /// One summary per day of `window`, in date order.
    async fn summaries(&self, window: WeekWindow) -> Result<Vec<DailySummary>>;

    /// Name of the account the credentials belong to. Doubles as a credentials check.
    async fn current_user(&self) -> Result<String>;
}

pub struct WakaTimeClient {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
    shutdown: CancellationToken,
}

impl WakaTimeClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: &str,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", STANDARD.encode(api_key.trim())),
            shutdown,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .header(AUTHORIZATION, &self.authorization)
    }
}

#[async_trait]
impl TimeTracker for WakaTimeClient {
    #[instrument(skip(self))]
    async fn summaries(&self, window: WeekWindow) -> Result<Vec<DailySummary>> {
        let query = [
            ("start", format_query_date(window.start)),
            ("end", format_query_date(window.end)),
        ];
        let request = self.get("/users/current/summaries").query(&query);
        let response = http::send(request, &self.shutdown, Vendor::WakaTime, describe_error)
            .await
            .context("error getting summaries")?;
        let body: SummariesResponse = response.json().await.context("error decoding summaries")?;
        info!("Received {} days of summaries", body.data.len());
        Ok(body.data.into_iter().map(DailySummary::from).collect())
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<String> {
        let response = http::send(
            self.get("/users/current"),
            &self.shutdown,
            Vendor::WakaTime,
            describe_error,
        )
        .await
        .context("error getting current user")?;
        let user: UserResponse = response.json().await.context("error decoding user")?;
        let name = user.data.display_name.or(user.data.username);
        Ok(name.unwrap_or_else(|| "unknown user".into()))
    }
}

/// Human readable message for a failed WakaTime request.
pub fn describe_error(status: u16, body: &str) -> String {
    match status {
        429 => "rate limit reached".into(),
        402 => "your plan doesn't cover this feature".into(),
        _ => {
            let entity = serde_json::from_str::<ErrorEntity>(body).unwrap_or_default();
            match entity.error {
                Some(error) => error,
                None if !entity.errors.is_empty() => entity.errors.join(","),
                None => "an error occurred".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use anyhow::Result;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use chrono::{Duration, NaiveDate};
    use tokio_util::sync::CancellationToken;

    use crate::{
        error::{Vendor, WakalogError},
        http::{build_client, test_server},
        report::{DailySummary, WeekWindow},
    };

    use super::{describe_error, entities::SummariesResponse, TimeTracker, WakaTimeClient};

    const SUMMARIES: &str = r#"{
        "data": [
            {
                "grand_total": {"hours": 2, "minutes": 5, "total_seconds": 7500.0, "text": "2 hrs 5 mins"},
                "range": {"date": "2024-03-04", "start": "2024-03-04T00:00:00Z", "end": "2024-03-04T23:59:59Z"},
                "projects": [
                    {"name": "wakalog", "hours": 2, "minutes": 0, "seconds": 3, "total_seconds": 7203.0, "percent": 96.0, "color": null},
                    {"name": "dotfiles", "hours": 0, "minutes": 4, "seconds": 57, "total_seconds": 297.0, "percent": 4.0}
                ]
            },
            {
                "range": {"date": "2024-03-05"},
                "projects": []
            }
        ],
        "cumulative_total": {"seconds": 7500.0, "text": "2 hrs 5 mins"},
        "start": "2024-03-04T00:00:00Z",
        "end": "2024-03-05T23:59:59Z"
    }"#;

    #[test]
    fn test_summaries_decoding() {
        let response: SummariesResponse = serde_json::from_str(SUMMARIES).unwrap();
        let days = response
            .data
            .into_iter()
            .map(DailySummary::from)
            .collect::<Vec<_>>();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(days[0].projects[0].name, "wakalog");
        assert_eq!(
            days[0].projects[0].duration,
            Duration::hours(2) + Duration::seconds(3)
        );
        assert_eq!(
            days[0].projects[1].duration,
            Duration::minutes(4) + Duration::seconds(57)
        );
        assert!(days[1].projects.is_empty());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(describe_error(429, ""), "rate limit reached");
        assert_eq!(
            describe_error(402, "{}"),
            "your plan doesn't cover this feature"
        );
        assert_eq!(
            describe_error(401, r#"{"error": "Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(
            describe_error(400, r#"{"errors": ["bad start", "bad end"]}"#),
            "bad start,bad end"
        );
        assert_eq!(describe_error(500, "<html>"), "an error occurred");
    }

    fn client(base_url: &str) -> Result<WakaTimeClient> {
        Ok(WakaTimeClient::new(
            build_client(StdDuration::from_secs(5))?,
            base_url,
            " waka_key ",
            CancellationToken::new(),
        ))
    }

    #[tokio::test]
    async fn test_summaries_request() -> Result<()> {
        let (url, request) = test_server::serve_once("200 OK", SUMMARIES).await;
        let window = WeekWindow {
            start: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
        };

        let days = client(&format!("{url}/"))?.summaries(window).await?;
        assert_eq!(days.len(), 2);

        let request = request.await?;
        let line = "GET /users/current/summaries?start=2024-03-04&end=2024-03-08 HTTP/1.1";
        let authorization = format!("authorization: Basic {}", STANDARD.encode("waka_key"));
        assert!(request.starts_with(line));
        assert!(request.contains(&authorization));
        Ok(())
    }

    #[tokio::test]
    async fn test_current_user_prefers_display_name() -> Result<()> {
        let body = r#"{"data": {"username": "ada", "display_name": "Ada Lovelace"}}"#;
        let (url, request) = test_server::serve_once("200 OK", body).await;

        assert_eq!(client(&url)?.current_user().await?, "Ada Lovelace");
        assert!(request.await?.starts_with("GET /users/current HTTP/1.1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_key() -> Result<()> {
        let body = r#"{"error": "Unauthorized"}"#;
        let (url, _) = test_server::serve_once("401 Unauthorized", body).await;

        let error = client(&url)?.current_user().await.unwrap_err();
        match error.downcast_ref::<WakalogError>() {
            Some(WakalogError::VendorApi {
                vendor,
                status,
                message,
            }) => {
                assert_eq!(*vendor, Vendor::WakaTime);
                assert_eq!(*status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error {other:?}"),
        }
        Ok(())
    }
}
