use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use yup_oauth2::{
    authenticator::DefaultAuthenticator, InstalledFlowAuthenticator, InstalledFlowReturnMethod,
};

use crate::error::WakalogError;

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// Provides bearer tokens for the Sheets API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// OAuth installed-application flow. The first run opens the consent page and listens for the
/// redirect on localhost; afterwards the token cache on disk is refreshed silently.
pub struct InstalledFlowTokens {
    authenticator: DefaultAuthenticator,
}

impl InstalledFlowTokens {
    pub async fn new(client_secret: &Path, token_cache: &Path) -> Result<Self> {
        let secret = yup_oauth2::read_application_secret(client_secret)
            .await
            .map_err(|e| {
                WakalogError::auth(format!(
                    "unable to read client secret file {}: {e}",
                    client_secret.display()
                ))
            })?;
        debug!("Using token cache {token_cache:?}");
        let authenticator =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                .persist_tokens_to_disk(token_cache)
                .build()
                .await
                .context("error setting up sheets authenticator")?;
        Ok(Self { authenticator })
    }
}

#[async_trait]
impl TokenSource for InstalledFlowTokens {
    async fn access_token(&self) -> Result<String> {
        let token = self
            .authenticator
            .token(SCOPES)
            .await
            .map_err(|e| WakalogError::auth(format!("error authorizing with sheets api: {e}")))?;
        let token = token
            .token()
            .ok_or_else(|| WakalogError::auth("sheets authorization returned no access token"))?;
        info!("Obtained sheets access token");
        Ok(token.to_string())
    }
}
