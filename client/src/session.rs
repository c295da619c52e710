use anyhow::{Context, Result};
use common::ops::TokenPair;
use log::debug;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::PathBuf;
use tokio::sync::Mutex;

const REFRESH_KEY: &str = "refresh_token";

/// Supplies the bearer credential attached to outgoing calls. The
/// access token lives in memory only; the refresh token is persisted to
/// a small JSON store file so a restart can resume the session.
///
/// Token contents are opaque here; issuing and validating them is the
/// server's business.
pub struct SessionRelay {
    store_path: PathBuf,
    access: Mutex<Option<String>>,
}

impl SessionRelay {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        SessionRelay {
            store_path: store_path.into(),
            access: Mutex::new(None),
        }
    }

    /// The credential for the next outgoing call, if signed in.
    pub async fn bearer(&self) -> Option<String> {
        self.access.lock().await.clone()
    }

    pub async fn signed_in(&self) -> bool {
        self.access.lock().await.is_some()
    }

    /// Adopt a fresh token pair: access kept in memory, refresh written
    /// through to the store file.
    pub async fn set_tokens(&self, tokens: &TokenPair) -> Result<()> {
        *self.access.lock().await = Some(tokens.access_token.clone());
        let mut store = self.read_store()?;
        store.insert(REFRESH_KEY.to_string(), json!(tokens.refresh_token));
        self.write_store(&store)
    }

    pub async fn clear(&self) -> Result<()> {
        *self.access.lock().await = None;
        let mut store = self.read_store()?;
        store.remove(REFRESH_KEY);
        self.write_store(&store)
    }

    /// The refresh token from a previous run, if any.
    pub fn stored_refresh(&self) -> Result<Option<String>> {
        let store = self.read_store()?;
        Ok(store
            .get(REFRESH_KEY)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }

    fn read_store(&self) -> Result<Map<String, Value>> {
        if !self.store_path.exists() {
            if let Some(parent) = self.store_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(&self.store_path, "{}")
                .with_context(|| format!("initializing {}", self.store_path.display()))?;
            debug!("initialized session store at {}", self.store_path.display());
        }
        let raw = fs::read_to_string(&self.store_path)
            .with_context(|| format!("reading {}", self.store_path.display()))?;
        let value: Value =
            serde_json::from_str(&raw).context("session store is not valid json")?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("session store is not a json object"),
        }
    }

    fn write_store(&self, store: &Map<String, Value>) -> Result<()> {
        let raw = serde_json::to_string_pretty(store)?;
        fs::write(&self.store_path, raw)
            .with_context(|| format!("writing {}", self.store_path.display()))?;
        Ok(())
    }
}
