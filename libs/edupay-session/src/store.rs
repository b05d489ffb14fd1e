//! Cookie-backed key-value persistence with expiry.
//!
//! Every entry is a cookie whose value is the JSON envelope
//! `{"data": ..., "expiresAt": <epoch ms>}`. Cookies are `SameSite=Strict`,
//! and `Secure` when the application origin is served over HTTPS. Reads fail
//! closed: an expired or corrupt entry is evicted and reported as absent.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::clock::Clock;
use crate::error::StoreResult;

/// Bearer token entry.
pub const TOKEN_KEY: &str = "edupay_token";

/// Id of the organization last selected by the user.
pub const SELECTED_SCHOOL_KEY: &str = "edupay_selected_school";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry<T> {
    data: T,
    expires_at: i64,
}

pub struct SessionStore {
    cookies: Mutex<BTreeMap<String, Cookie<'static>>>,
    path: Option<PathBuf>,
    secure: bool,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Create a store that lives only as long as the process.
    pub fn in_memory(origin: &Url, clock: Arc<dyn Clock>) -> Self {
        Self {
            cookies: Mutex::new(BTreeMap::new()),
            path: None,
            secure: origin.scheme() == "https",
            clock,
        }
    }

    /// Open a file-backed store, loading any cookies persisted earlier.
    ///
    /// Unparseable lines are skipped; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>, origin: &Url, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let path = path.into();
        let cookies = match std::fs::read_to_string(&path) {
            Ok(contents) => parse_cookie_lines(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = cookies.len(), "Loaded session store");

        Ok(Self {
            cookies: Mutex::new(cookies),
            path: Some(path),
            secure: origin.scheme() == "https",
            clock,
        })
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Persist `value` under `key` for `ttl`.
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> StoreResult<()> {
        let expires = self.clock.now() + ttl;
        let entry = StoredEntry {
            data: value,
            expires_at: (expires.unix_timestamp_nanos() / 1_000_000) as i64,
        };
        let json = serde_json::to_string(&entry)?;

        let cookie = Cookie::build((key.to_string(), json))
            .path("/")
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .expires(expires)
            .build();

        let mut cookies = self.lock();
        cookies.insert(key.to_string(), cookie);
        self.flush(&cookies)
    }

    /// Read the entry under `key`.
    ///
    /// Returns `None` (and evicts the entry) when it has expired or its
    /// payload cannot be parsed as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut cookies = self.lock();
        let raw = cookies.get(key)?.value().to_string();

        let live = serde_json::from_str::<StoredEntry<T>>(&raw)
            .ok()
            .filter(|entry| self.clock.now_epoch_millis() <= entry.expires_at);

        match live {
            Some(entry) => Some(entry.data),
            None => {
                debug!(key, "Evicting stale or corrupt session store entry");
                cookies.remove(key);
                if let Err(e) = self.flush(&cookies) {
                    warn!(key, error = %e, "Failed to persist eviction");
                }
                None
            }
        }
    }

    /// Evict the entry under `key` unconditionally.
    pub fn remove(&self, key: &str) {
        let mut cookies = self.lock();
        if cookies.remove(key).is_some() {
            if let Err(e) = self.flush(&cookies) {
                warn!(key, error = %e, "Failed to persist removal");
            }
        }
    }

    /// The raw cookie stored under `key`, attributes included.
    pub fn cookie(&self, key: &str) -> Option<Cookie<'static>> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Cookie<'static>>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, cookies: &BTreeMap<String, Cookie<'static>>) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_cookie_lines(path, cookies)
    }
}

fn parse_cookie_lines(contents: &str) -> BTreeMap<String, Cookie<'static>> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match Cookie::parse_encoded(line.to_string()) {
            Ok(cookie) => Some((cookie.name().to_string(), cookie)),
            Err(e) => {
                warn!(error = %e, "Skipping unparseable persisted cookie");
                None
            }
        })
        .collect()
}

fn write_cookie_lines(path: &Path, cookies: &BTreeMap<String, Cookie<'static>>) -> StoreResult<()> {
    let body: String = cookies
        .values()
        .map(|cookie| format!("{}\n", cookie.encoded()))
        .collect();

    // Write to a sibling file first so a crash never leaves a torn store.
    let tmp = path.with_extension("tmp");
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&tmp)?;
    // A leftover tmp file keeps its old mode, so tighten it explicitly.
    #[cfg(unix)]
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(body.as_bytes())?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, path)?;
    Ok(())
}
