//! Per-browser-session authorization state
//!
//! An [`AuthSession`] holds the CSRF token and, for public clients, the PKCE
//! verifier between the redirect to the provider and the callback. It lives
//! in a [`SessionStore`] keyed by the caller's session identifier and is
//! removed when the callback is processed, so it can be consumed only once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::auth::pkce::PkceVerifier;
use crate::auth::random;
use crate::config::FlowKind;
use crate::error::AuthResult;

/// Session key of the CSRF token.
pub const CSRF_KEY: &str = "csrf";

/// Session key of the PKCE verifier.
pub const VERIFIER_KEY: &str = "verifier";

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// String-keyed values scoped to a session identifier.
///
/// Values set before the redirect must be readable after the provider's
/// callback for the same session identifier.
pub trait SessionStore: Send + Sync {
    /// Returns the value stored under `key` for `session_id`.
    fn get(&self, session_id: &str, key: &str) -> Option<String>;

    /// Stores `value` under `key` for `session_id`, replacing any previous value.
    fn set(&self, session_id: &str, key: &str, value: String);

    /// Removes and returns the value stored under `key` for `session_id`.
    fn remove(&self, session_id: &str, key: &str) -> Option<String>;
}

/// How long an unanswered authorization attempt stays in a
/// [`MemorySessionStore`] by default.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60);

/// Process-local [`SessionStore`].
///
/// Values expire `ttl` after they were set, so abandoned logins do not
/// accumulate. Expired values read as absent and are pruned on every `set`.
/// Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    values: Arc<DashMap<(String, String), StoredValue>>,
    ttl: Duration,
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    stored_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl MemorySessionStore {
    /// Creates an empty store with [`DEFAULT_SESSION_TTL`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose values expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            values: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Lifetime of stored values.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored values across all sessions, expired ones included
    /// until the next prune.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every expired value.
    pub fn prune_expired(&self) {
        let ttl = self.ttl;
        self.values.retain(|_, stored| !stored.is_expired(ttl));
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str, key: &str) -> Option<String> {
        let key = (session_id.to_owned(), key.to_owned());
        let ttl = self.ttl;
        // Removes the entry only if it is still the expired one.
        if self.values.remove_if(&key, |_, stored| stored.is_expired(ttl)).is_some() {
            return None;
        }
        self.values.get(&key).map(|entry| entry.value().value.clone())
    }

    fn set(&self, session_id: &str, key: &str, value: String) {
        self.prune_expired();
        self.values.insert(
            (session_id.to_owned(), key.to_owned()),
            StoredValue {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    fn remove(&self, session_id: &str, key: &str) -> Option<String> {
        let ttl = self.ttl;
        self.values
            .remove(&(session_id.to_owned(), key.to_owned()))
            .filter(|(_, stored)| !stored.is_expired(ttl))
            .map(|(_, stored)| stored.value)
    }
}

// ---------------------------------------------------------------------------
// AuthSession
// ---------------------------------------------------------------------------

/// CSRF token and optional PKCE verifier for one authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub csrf: String,
    pub verifier: Option<PkceVerifier>,
}

impl AuthSession {
    /// Starts a session for a confidential client: CSRF token only.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthError::InsufficientEntropy`] when the secure
    /// random source fails.
    pub fn new_code() -> AuthResult<Self> {
        Ok(Self {
            csrf: random::generate(random::HEX, random::CSRF_TOKEN_BYTES)?,
            verifier: None,
        })
    }

    /// Starts a session for a public client: CSRF token and PKCE verifier.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthError::InsufficientEntropy`] when the secure
    /// random source fails.
    pub fn new_pkce() -> AuthResult<Self> {
        Ok(Self {
            csrf: random::generate(random::HEX, random::CSRF_TOKEN_BYTES)?,
            verifier: Some(PkceVerifier::generate()?),
        })
    }

    /// Starts a session suited to `flow`.
    pub fn for_flow(flow: FlowKind) -> AuthResult<Self> {
        match flow {
            FlowKind::Code => Self::new_code(),
            FlowKind::Pkce => Self::new_pkce(),
        }
    }

    /// Writes the session into `store`, replacing an earlier attempt.
    pub fn save(&self, store: &dyn SessionStore, session_id: &str) {
        store.set(session_id, CSRF_KEY, self.csrf.clone());
        match &self.verifier {
            Some(verifier) => store.set(session_id, VERIFIER_KEY, verifier.as_str().to_string()),
            None => {
                store.remove(session_id, VERIFIER_KEY);
            }
        }
    }

    /// Removes the session from `store` and returns it.
    ///
    /// Both keys are removed even when the CSRF token is missing. Returns
    /// `None` when no CSRF token was stored. A stored verifier that no
    /// longer validates is dropped.
    pub fn take(store: &dyn SessionStore, session_id: &str) -> Option<Self> {
        let csrf = store.remove(session_id, CSRF_KEY);
        let verifier = store.remove(session_id, VERIFIER_KEY);
        let csrf = csrf?;
        Some(Self {
            csrf,
            verifier: verifier.and_then(|v| PkceVerifier::new(v).ok()),
        })
    }
}
