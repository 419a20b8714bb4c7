//! Thin client over the Sheets v4 REST API. Only the three calls the log command needs are
//! implemented.

pub mod auth;

use anyhow::{Context, Result};
use async_trait::async_trait;
use auth::TokenSource;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use urlencoding::encode;

use crate::{
    error::{Vendor, WakalogError},
    http,
};

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Browser link to a sheet of the spreadsheet.
    fn sheet_link(&self, sheet_id: i64) -> String;

    /// All sheets in the order they appear in the spreadsheet.
    async fn sheets(&self) -> Result<Vec<SheetProperties>>;

    /// Values of `range`, grouped by column.
    async fn column_values(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Writes rows starting at `range` without any value parsing on Google's side.
    async fn batch_update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()>;
}

pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    tokens: Box<dyn TokenSource>,
    shutdown: CancellationToken,
}

impl SheetsClient {
    pub fn new(
        http: reqwest::Client,
        spreadsheet_id: String,
        tokens: Box<dyn TokenSource>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            http,
            base_url: SHEETS_BASE_URL.into(),
            spreadsheet_id,
            tokens,
            shutdown,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(WakalogError::Cancelled.into()),
            token = self.tokens.access_token() => token?,
        };
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let request = self.authorized(request).await?;
        http::send(request, &self.shutdown, Vendor::GoogleSheets, describe_error).await
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{suffix}", self.base_url, self.spreadsheet_id)
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetEntity {
    #[serde(default)]
    sheets: Vec<SheetEntity>,
}

#[derive(Debug, Deserialize)]
struct SheetEntity {
    properties: SheetPropertiesEntity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetPropertiesEntity {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRangeEntity {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorEntity,
}

#[derive(Debug, Deserialize)]
struct ErrorEntity {
    message: String,
}

#[async_trait]
impl SpreadsheetService for SheetsClient {
    fn sheet_link(&self, sheet_id: i64) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/edit?gid={sheet_id}#gid={sheet_id}",
            self.spreadsheet_id
        )
    }

    #[instrument(skip(self))]
    async fn sheets(&self) -> Result<Vec<SheetProperties>> {
        let request = self
            .http
            .get(self.url(""))
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let spreadsheet: SpreadsheetEntity = self
            .send(request)
            .await
            .context("error retrieving spreadsheet")?
            .json()
            .await
            .context("error decoding spreadsheet")?;
        debug!("Spreadsheet has {} sheets", spreadsheet.sheets.len());
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|v| SheetProperties {
                sheet_id: v.properties.sheet_id,
                title: v.properties.title,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn column_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let request = self
            .http
            .get(self.url(&format!("/values/{}", encode(range))))
            .query(&[("majorDimension", "COLUMNS")]);
        let values: ValueRangeEntity = self
            .send(request)
            .await
            .with_context(|| format!("error retrieving values of {range}"))?
            .json()
            .await
            .context("error decoding values")?;
        Ok(values
            .values
            .into_iter()
            .map(|column| column.into_iter().map(cell_to_string).collect())
            .collect())
    }

    #[instrument(skip(self, values))]
    async fn batch_update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let body = json!({
            "valueInputOption": "RAW",
            "data": [{
                "range": range,
                "majorDimension": "ROWS",
                "values": values,
            }],
        });
        let request = self.http.post(self.url("/values:batchUpdate")).json(&body);
        self.send(request)
            .await
            .context("unable to write data on sheet")?;
        info!("Wrote {range}");
        Ok(())
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(v) => v,
        other => other.to_string(),
    }
}

/// Message of a failed Sheets request, taken from the standard Google error body.
pub fn describe_error(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|v| v.error.message)
        .unwrap_or_else(|_| format!("unexpected status code {status}"))
}

/// The sheet for a month lives at position `month - 1`.
pub fn sheet_for_month(sheets: &[SheetProperties], month: u32) -> Option<&SheetProperties> {
    sheets.get(month.checked_sub(1)? as usize)
}

/// Flattens a column-major response into trimmed names.
pub fn names_from_columns(columns: Vec<Vec<String>>) -> Vec<String> {
    columns
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tokio_util::sync::CancellationToken;

    use crate::{
        error::{Vendor, WakalogError},
        http::{build_client, test_server},
        sheets::auth::MockTokenSource,
    };

    use super::{
        describe_error, names_from_columns, sheet_for_month, SheetProperties, SheetsClient,
        SpreadsheetService,
    };

    fn client(base_url: &str) -> Result<SheetsClient> {
        let mut tokens = MockTokenSource::new();
        tokens
            .expect_access_token()
            .returning(|| Ok("token-123".into()));
        Ok(SheetsClient::new(
            build_client(Duration::from_secs(5))?,
            "sheet-abc".into(),
            Box::new(tokens),
            CancellationToken::new(),
        )
        .with_base_url(base_url))
    }

    fn sheets() -> Vec<SheetProperties> {
        ["January", "February", "March"]
            .into_iter()
            .enumerate()
            .map(|(i, title)| SheetProperties {
                sheet_id: i as i64 * 100,
                title: title.into(),
            })
            .collect()
    }

    #[test]
    fn test_sheet_for_month() {
        let sheets = sheets();
        assert_eq!(sheet_for_month(&sheets, 1).unwrap().title, "January");
        assert_eq!(sheet_for_month(&sheets, 3).unwrap().sheet_id, 200);
        assert_eq!(sheet_for_month(&sheets, 4), None);
        assert_eq!(sheet_for_month(&sheets, 0), None);
    }

    #[test]
    fn test_names_from_columns() {
        let columns = vec![vec![" Ada ".into(), "Grace".into(), String::new()]];
        assert_eq!(names_from_columns(columns), vec!["Ada", "Grace", ""]);
        assert!(names_from_columns(vec![]).is_empty());
    }

    #[test]
    fn test_describe_error() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission"}}"#;
        assert_eq!(describe_error(403, body), "The caller does not have permission");
        assert_eq!(describe_error(502, "Bad gateway"), "unexpected status code 502");
    }

    #[test]
    fn test_sheet_link() {
        let client = SheetsClient::new(
            reqwest::Client::new(),
            "abc".into(),
            Box::new(MockTokenSource::new()),
            CancellationToken::new(),
        );
        assert_eq!(
            client.sheet_link(7),
            "https://docs.google.com/spreadsheets/d/abc/edit?gid=7#gid=7"
        );
    }

    #[tokio::test]
    async fn test_batch_update_request() -> Result<()> {
        let (url, request) = test_server::serve_once("200 OK", "{}").await;

        let row = vec!["1h20m0s".to_string(), "Mon 18 Mar".into(), "4h0m0s".into()];
        let values = vec![row];
        client(&url)?
            .batch_update_values("'Q1 2024'!K5", values.clone())
            .await?;

        let request = request.await?;
        assert!(request.starts_with("POST /sheet-abc/values:batchUpdate HTTP/1.1"));
        assert!(request.contains("authorization: Bearer token-123"));

        let body: serde_json::Value = serde_json::from_str(test_server::body(&request))?;
        assert_eq!(body["valueInputOption"], "RAW");
        assert_eq!(body["data"][0]["range"], "'Q1 2024'!K5");
        assert_eq!(body["data"][0]["majorDimension"], "ROWS");
        assert_eq!(body["data"][0]["values"], serde_json::json!(values));
        Ok(())
    }

    #[tokio::test]
    async fn test_column_values_request() -> Result<()> {
        let body = r#"{"range": "March!B3:B4", "values": [["Ada", "Grace"]]}"#;
        let (url, request) = test_server::serve_once("200 OK", body).await;

        let columns = client(&url)?.column_values("March!B3:B").await?;
        assert_eq!(columns, vec![vec!["Ada".to_string(), "Grace".to_string()]]);

        let line = "GET /sheet-abc/values/March%21B3%3AB?majorDimension=COLUMNS HTTP/1.1";
        assert!(request.await?.starts_with(line));
        Ok(())
    }

    #[tokio::test]
    async fn test_sheets_request() -> Result<()> {
        let body = concat!(
            r#"{"sheets": [{"properties": {"sheetId": 0, "title": "January"}}, "#,
            r#"{"properties": {"sheetId": 42, "title": "February"}}]}"#
        );
        let (url, _) = test_server::serve_once("200 OK", body).await;

        let sheets = client(&url)?.sheets().await?;
        assert_eq!(
            sheets,
            vec![
                SheetProperties {
                    sheet_id: 0,
                    title: "January".into(),
                },
                SheetProperties {
                    sheet_id: 42,
                    title: "February".into(),
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_permission_error() -> Result<()> {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission"}}"#;
        let (url, _) = test_server::serve_once("403 Forbidden", body).await;

        let error = client(&url)?.sheets().await.unwrap_err();
        match error.downcast_ref::<WakalogError>() {
            Some(WakalogError::VendorApi {
                vendor,
                status,
                message,
            }) => {
                assert_eq!(*vendor, Vendor::GoogleSheets);
                assert_eq!(*status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("unexpected error {other:?}"),
        }
        Ok(())
    }
}
