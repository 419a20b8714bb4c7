//! Pieces shared by the WakaTime and Sheets clients.

use std::time::Duration;

use anyhow::Result;
use reqwest::{RequestBuilder, Response};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Vendor, WakalogError};

pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

/// Sends `request` unless `shutdown` fires first. Non-2xx responses are turned into
/// [WakalogError::VendorApi] with the message extracted from the body by `describe`.
pub async fn send(
    request: RequestBuilder,
    shutdown: &CancellationToken,
    vendor: Vendor,
    describe: fn(u16, &str) -> String,
) -> Result<Response> {
    let response = tokio::select! {
        _ = shutdown.cancelled() => return Err(WakalogError::Cancelled.into()),
        response = request.send() => response?,
    };

    let status = response.status();
    debug!("{vendor} responded with {status}");
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Unable to read {vendor} error body {e:?}");
            String::new()
        }
    };
    warn!("{vendor} request failed with {status}: {body}");
    Err(WakalogError::VendorApi {
        vendor,
        status: status.as_u16(),
        message: describe(status.as_u16(), &body),
    }
    .into())
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tokio_util::sync::CancellationToken;

    use crate::{
        cli::exit_code,
        error::{Vendor, WakalogError},
        utils::logging::TEST_LOGGING,
        wakatime::describe_error,
    };

    use super::{build_client, send, test_server};

    #[tokio::test]
    async fn test_cancellation_aborts_request() -> Result<()> {
        *TEST_LOGGING;
        let url = test_server::unresponsive().await;
        let client = build_client(Duration::from_secs(30))?;
        let shutdown = CancellationToken::new();

        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let request = client.get(url);
        let error = send(request, &shutdown, Vendor::WakaTime, describe_error)
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<WakalogError>(),
            Some(WakalogError::Cancelled)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_becomes_vendor_error() -> Result<()> {
        let (url, _) = test_server::serve_once("429 Too Many Requests", "{}").await;
        let client = build_client(Duration::from_secs(5))?;

        let error = send(
            client.get(url),
            &CancellationToken::new(),
            Vendor::WakaTime,
            describe_error,
        )
        .await
        .unwrap_err();

        match error.downcast_ref::<WakalogError>() {
            Some(WakalogError::VendorApi {
                vendor,
                status,
                message,
            }) => {
                assert_eq!(*vendor, Vendor::WakaTime);
                assert_eq!(*status, 429);
                assert_eq!(message, "rate limit reached");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            exit_code(&error),
            ("WakaTime Error: rate limit reached (429)".to_string(), 429)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_error_body_is_described() -> Result<()> {
        let body = r#"{"error": "Invalid api key"}"#;
        let (url, _) = test_server::serve_once("401 Unauthorized", body).await;
        let client = build_client(Duration::from_secs(5))?;

        let error = send(
            client.get(url),
            &CancellationToken::new(),
            Vendor::WakaTime,
            describe_error,
        )
        .await
        .unwrap_err();

        assert_eq!(
            exit_code(&error),
            ("WakaTime Error: Invalid api key (401)".to_string(), 401)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_success_is_returned() -> Result<()> {
        let (url, request) = test_server::serve_once("200 OK", r#"{"ok": true}"#).await;
        let client = build_client(Duration::from_secs(5))?;

        let response = send(
            client.get(format!("{url}/ping")),
            &CancellationToken::new(),
            Vendor::GoogleSheets,
            describe_error,
        )
        .await?;

        assert_eq!(response.text().await?, r#"{"ok": true}"#);
        assert!(request.await?.starts_with("GET /ping HTTP/1.1"));
        Ok(())
    }
}
