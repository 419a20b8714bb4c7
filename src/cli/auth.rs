use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::{
    error::WakalogError,
    store::{CredentialStore, StoreError},
    wakatime::TimeTracker,
};

use super::prompt::Prompter;

const API_KEY_PROMPT: &str = "Enter your WakaTime API key (https://wakatime.com/settings/api-key):";

/// Account the stored key belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub api_key: String,
    pub display_name: String,
}

/// Asks for a new API key, checks it against WakaTime and stores it. `connect` builds a tracker
/// for a candidate key.
#[instrument(skip_all)]
pub async fn authenticate(
    store: &dyn CredentialStore,
    prompter: &dyn Prompter,
    connect: impl Fn(&str) -> Box<dyn TimeTracker>,
) -> Result<Authenticated> {
    let api_key = prompter.secret(API_KEY_PROMPT)?.trim().to_string();

    let display_name = match connect(&api_key).current_user().await {
        Ok(display_name) => display_name,
        Err(e) if WakalogError::is_cancellation(&e) => return Err(e),
        Err(e) => {
            warn!("API key was rejected {e:?}");
            let message = format!("unable to verify WakaTime API key: {}", e.root_cause());
            return Err(WakalogError::auth(message).into());
        }
    };

    store.store_api_key(&api_key).await?;
    info!("Authenticated as {display_name}");
    Ok(Authenticated {
        api_key,
        display_name,
    })
}

/// Key used by `log`. An explicit override wins, then the stored key. Without either the user is
/// taken through [authenticate].
pub async fn ensure_api_key(
    api_key_override: Option<&str>,
    store: &dyn CredentialStore,
    prompter: &dyn Prompter,
    connect: impl Fn(&str) -> Box<dyn TimeTracker>,
) -> Result<String> {
    if let Some(key) = api_key_override {
        return Ok(key.to_string());
    }

    match store.get_api_key().await {
        Ok(key) => Ok(key),
        Err(StoreError::NotFound) => {
            println!("No WakaTime API key found.");
            Ok(authenticate(store, prompter, connect).await?.api_key)
        }
        Err(e) => Err(e.into()),
    }
}
