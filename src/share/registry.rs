//! Share registry.
//!
//! Maps opaque tokens to share records for the lifetime of the process.
//! Expired records are evicted lazily when they are looked up, or in bulk
//! by [`ShareRegistry::sweep_expired`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{Result, ShareError};

/// Source of the current time, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A directory exposed under a token.
#[derive(Clone, PartialEq, Eq)]
pub struct ShareRecord {
    /// Random identifier, the registry key.
    pub token: String,
    /// Canonical path of the shared directory.
    pub root: PathBuf,
    /// Shared secret, compared verbatim.
    pub password: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry time, `None` for shares that never expire.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShareRecord {
    /// Whether the share has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now > expires_at)
    }

    /// Display name of the shared directory.
    pub fn root_name(&self) -> Option<String> {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

impl fmt::Debug for ShareRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareRecord")
            .field("token", &self.token)
            .field("root", &self.root)
            .field("password", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Requested lifetime of a new share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Use the registry's default lifetime.
    #[default]
    Default,
    /// Never expire.
    Never,
    /// Expire after the given number of minutes.
    Minutes(u64),
}

impl Expiry {
    /// Interpret a client-supplied minute count: zero or negative means never.
    pub fn from_minutes(minutes: i64) -> Self {
        if minutes > 0 {
            Expiry::Minutes(minutes as u64)
        } else {
            Expiry::Never
        }
    }

    /// Compute the expiry timestamp for a share created at `now`.
    pub fn expires_at(self, now: DateTime<Utc>, default_minutes: u64) -> Option<DateTime<Utc>> {
        let minutes = match self {
            Expiry::Never => return None,
            Expiry::Minutes(m) => m,
            Expiry::Default if default_minutes == 0 => return None,
            Expiry::Default => default_minutes,
        };
        // Unrepresentable lifetimes fall back to the default, never to "never"
        let expires_at = deadline(now, minutes)
            .or_else(|| deadline(now, default_minutes).filter(|_| default_minutes > 0))
            .or_else(|| deadline(now, FALLBACK_EXPIRY_MINUTES))
            .unwrap_or(now);
        Some(expires_at)
    }
}

/// Lifetime used when neither the requested nor the configured one is usable.
const FALLBACK_EXPIRY_MINUTES: u64 = 24 * 60;

fn deadline(now: DateTime<Utc>, minutes: u64) -> Option<DateTime<Utc>> {
    let minutes = i64::try_from(minutes).ok()?;
    Duration::try_minutes(minutes).and_then(|d| now.checked_add_signed(d))
}

/// Parameters for creating a share.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// Directory to share, as typed by the sender. `~` is expanded.
    pub root: String,
    /// Shared secret.
    pub password: String,
    /// Requested lifetime.
    pub expiry: Expiry,
}

impl NewShare {
    /// Create share parameters with the default expiry.
    pub fn new(root: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            password: password.into(),
            expiry: Expiry::Default,
        }
    }

    /// Set the requested expiry.
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }
}

/// Registry of live shares.
pub trait ShareRegistry: Send + Sync {
    /// Validate the root directory and store a new share.
    fn create(&self, share: NewShare) -> Result<ShareRecord>;

    /// Look up a share, evicting it and returning [`ShareError::Expired`] if its time is up.
    fn get(&self, token: &str) -> Result<ShareRecord>;

    /// Remove a share. Returns `true` if one was removed; absent tokens are not an error.
    fn revoke(&self, token: &str) -> bool;

    /// Remove every expired share and return their tokens.
    fn sweep_expired(&self) -> Vec<String>;

    /// Number of stored shares, expired ones included until evicted.
    fn len(&self) -> usize;

    /// Whether the registry holds no shares.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve the directory a sender asked to share.
///
/// Expands a leading `~`, canonicalizes, and requires an existing directory.
pub fn resolve_root(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ShareError::BadRequest(
            "directory path is required".to_string(),
        ));
    }

    let expanded = expand_home(raw)?;
    let invalid = || {
        ShareError::InvalidPath("directory does not exist or is not a directory".to_string())
    };

    let root = std::fs::canonicalize(&expanded).map_err(|_| invalid())?;
    if !root.is_dir() {
        return Err(invalid());
    }
    Ok(root)
}

fn expand_home(raw: &str) -> Result<PathBuf> {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(raw)),
    };

    let home = dirs::home_dir().ok_or_else(|| {
        ShareError::InvalidPath("home directory could not be determined".to_string())
    })?;
    let rest = rest.trim_start_matches(['/', '\\']);
    Ok(if rest.is_empty() {
        home
    } else {
        home.join(Path::new(rest))
    })
}

/// Generate a share token: 128 random bits as 32 lowercase hex characters.
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// In-memory registry guarded by a single mutex.
///
/// The lock is held only while the map is read or written; root validation
/// happens before it is taken.
pub struct InMemoryShareRegistry {
    shares: Mutex<HashMap<String, ShareRecord>>,
    clock: Clock,
    default_expiry_minutes: u64,
}

impl InMemoryShareRegistry {
    /// Create a registry using the system clock.
    pub fn new(default_expiry_minutes: u64) -> Self {
        Self::with_clock(default_expiry_minutes, Arc::new(Utc::now))
    }

    /// Create a registry with a custom clock.
    pub fn with_clock(default_expiry_minutes: u64, clock: Clock) -> Self {
        Self {
            shares: Mutex::new(HashMap::new()),
            clock,
            default_expiry_minutes,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ShareRecord>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.shares.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ShareRegistry for InMemoryShareRegistry {
    fn create(&self, share: NewShare) -> Result<ShareRecord> {
        let root = resolve_root(&share.root)?;
        let now = self.now();
        let expires_at = share.expiry.expires_at(now, self.default_expiry_minutes);

        let mut shares = self.lock();
        let token = loop {
            let token = generate_token();
            if !shares.contains_key(&token) {
                break token;
            }
        };

        let record = ShareRecord {
            token: token.clone(),
            root,
            password: share.password,
            created_at: now,
            expires_at,
        };
        shares.insert(token, record.clone());
        Ok(record)
    }

    fn get(&self, token: &str) -> Result<ShareRecord> {
        let now = self.now();
        let mut shares = self.lock();

        match shares.get(token) {
            None => Err(ShareError::NotFound("share".to_string())),
            Some(record) if record.is_expired_at(now) => {
                shares.remove(token);
                Err(ShareError::Expired)
            }
            Some(record) => Ok(record.clone()),
        }
    }

    fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    fn sweep_expired(&self) -> Vec<String> {
        let now = self.now();
        let mut shares = self.lock();

        let expired: Vec<String> = shares
            .values()
            .filter(|record| record.is_expired_at(now))
            .map(|record| record.token.clone())
            .collect();
        for token in &expired {
            shares.remove(token);
        }
        expired
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
