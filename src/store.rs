//! Local credential cache. The WakaTime API key is kept in a small JSON file inside the
//! application directory, locked while it is read or written.

use std::{
    collections::BTreeMap,
    io::{self, ErrorKind},
    path::PathBuf,
};

use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, info};

const API_KEY_ENTRY: &str = "wakatime_api_key";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("wakatime API key not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns [StoreError::NotFound] if no key was stored or the stored key is blank.
    async fn get_api_key(&self) -> Result<String>;

    async fn store_api_key(&self, api_key: &str) -> Result<()>;
}

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let entries = read_from(&mut file).await;
        file.unlock_async().await?;
        entries
    }

    /// Opens the file for a read-modify-write, restricting it to the current user.
    async fn open_for_write(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut options = File::options();
        options.write(true).read(true).create(true).truncate(false);
        #[cfg(unix)]
        options.mode(0o600);
        let file = options.open(&self.path).await?;

        // Files created by older versions or by hand keep their mode otherwise.
        #[cfg(unix)]
        {
            use std::{fs::Permissions, os::unix::fs::PermissionsExt};
            file.set_permissions(Permissions::from_mode(0o600)).await?;
        }
        Ok(file)
    }

    async fn write_entry(&self, key: &str, value: &str) -> Result<()> {
        let mut file = self.open_for_write().await?;
        file.lock_exclusive()?;
        let result = async {
            let mut entries = read_from(&mut file).await?;
            entries.insert(key.to_string(), value.to_string());
            let buffer = serde_json::to_vec_pretty(&entries)?;

            file.set_len(0).await?;
            file.rewind().await?;
            file.write_all(&buffer).await?;
            file.flush().await?;
            Ok::<_, StoreError>(())
        }
        .await;
        file.unlock_async().await?;
        result
    }
}

/// Reads the whole file from the start. Callers hold the lock.
async fn read_from(file: &mut File) -> Result<BTreeMap<String, String>> {
    file.rewind().await?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).await?;

    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get_api_key(&self) -> Result<String> {
        debug!("Reading credentials from {:?}", self.path);
        let entries = self.read_entries().await?;
        match entries.get(API_KEY_ENTRY) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn store_api_key(&self, api_key: &str) -> Result<()> {
        self.write_entry(API_KEY_ENTRY, api_key.trim()).await?;
        info!("Stored API key in {:?}", self.path);
        Ok(())
    }
}
