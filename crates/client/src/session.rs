//! Token storage and the authenticated session state machine.
//!
//! [`TokenStore`] owns the access/refresh pair: opaque bearer strings,
//! mirrored to durable storage on every mutation so a session survives
//! process restart, cleared together and never independently.
//!
//! [`ProfileSession`] layers the user profile and the
//! login/register/refresh/logout flows on top. Both are handed their
//! collaborators at construction; nothing reaches across stores at call
//! time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

use crate::api::ApiClient;
use crate::api::types::{
    Credentials, ProfileUpdateInput, RegistrationInput, UserProfile,
};
use crate::error::{ApiError, Result};
use crate::storage::{LocalStore, REFRESH_TOKEN_KEY, StorageError, TOKEN_KEY};

// ─────────────────────────────────────────────────────────────────────────────
// TokenStore
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct TokenState {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

/// Holds the access/refresh token pair, write-through to durable storage.
///
/// Tokens are opaque bearer strings; no contents are inspected. Authenticated
/// status is simply "an access token is present".
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<TokenStoreInner>,
}

struct TokenStoreInner {
    store: LocalStore,
    tokens: RwLock<TokenState>,
}

impl TokenStore {
    /// Create a token store, restoring any pair persisted by a prior session.
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        let state = TokenState {
            access: store.get(TOKEN_KEY).map(SecretString::from),
            refresh: store.get(REFRESH_TOKEN_KEY).map(SecretString::from),
        };

        Self {
            inner: Arc::new(TokenStoreInner {
                store,
                tokens: RwLock::new(state),
            }),
        }
    }

    /// Store a fresh token pair, in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair cannot be persisted. The in-memory pair
    /// is set regardless.
    pub fn set_tokens(&self, access: &str, refresh: &str) -> std::result::Result<(), StorageError> {
        {
            let mut state = self.write();
            state.access = Some(SecretString::from(access.to_owned()));
            state.refresh = Some(SecretString::from(refresh.to_owned()));
        }
        self.inner.store.set(TOKEN_KEY, access)?;
        self.inner.store.set(REFRESH_TOKEN_KEY, refresh)?;
        Ok(())
    }

    /// Replace only the access token (refresh flow), leaving the refresh
    /// token unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    pub fn set_access(&self, access: &str) -> std::result::Result<(), StorageError> {
        self.write().access = Some(SecretString::from(access.to_owned()));
        self.inner.store.set(TOKEN_KEY, access)
    }

    /// Drop both tokens from memory and durable storage.
    ///
    /// Storage failures are logged, not surfaced: logout must always
    /// succeed from the caller's point of view.
    pub fn clear(&self) {
        {
            let mut state = self.write();
            state.access = None;
            state.refresh = None;
        }
        for key in [TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(error) = self.inner.store.remove(key) {
                tracing::warn!(%error, key, "Failed to remove token from storage");
            }
        }
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().access.is_some()
    }

    /// The current access token, for bearer injection.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.read()
            .access
            .as_ref()
            .map(|token| token.expose_secret().to_string())
    }

    /// The current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read()
            .refresh
            .as_ref()
            .map(|token| token.expose_secret().to_string())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TokenState> {
        self.inner
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TokenState> {
        self.inner
            .tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("TokenStore")
            .field(
                "access",
                &state.access.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "refresh",
                &state.refresh.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProfileSession
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated session: token pair plus user profile.
///
/// Concurrent logins are not coordinated; the last call to mutate state
/// wins. Each operation has a fixed failure policy, documented on it, and
/// none of them panic.
#[derive(Clone)]
pub struct ProfileSession {
    inner: Arc<ProfileSessionInner>,
}

struct ProfileSessionInner {
    api: ApiClient,
    tokens: TokenStore,
    profile: RwLock<Option<UserProfile>>,
    loading: AtomicBool,
}

impl ProfileSession {
    /// Create a session over an API client and token store.
    #[must_use]
    pub fn new(api: ApiClient, tokens: TokenStore) -> Self {
        Self {
            inner: Arc::new(ProfileSessionInner {
                api,
                tokens,
                profile: RwLock::new(None),
                loading: AtomicBool::new(false),
            }),
        }
    }

    /// Log in with username/password.
    ///
    /// On success the token pair is persisted and the profile fetched.
    /// On failure the session transitions to anonymous (full logout) and
    /// the error propagates so the caller can decide on messaging.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential exchange or token persistence
    /// fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        self.inner.loading.store(true, Ordering::SeqCst);
        let result = self.login_inner(credentials).await;
        self.inner.loading.store(false, Ordering::SeqCst);
        result
    }

    async fn login_inner(&self, credentials: &Credentials) -> Result<()> {
        let pair = match self.inner.api.login(credentials).await {
            Ok(pair) => pair,
            Err(error) => {
                tracing::error!(%error, username = %credentials.username, "Login failed");
                self.logout();
                return Err(error);
            }
        };

        if let Err(error) = self.inner.tokens.set_tokens(&pair.access, &pair.refresh) {
            self.logout();
            return Err(ApiError::Storage(error));
        }

        // Best-effort: a profile fetch failure does not undo the login, it
        // follows fetch_profile's own policy (401 logs out, others log).
        if let Err(error) = self.fetch_profile().await {
            tracing::warn!(%error, "Profile fetch after login failed");
        }

        Ok(())
    }

    /// Register a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration payload is rejected.
    pub async fn register(&self, input: &RegistrationInput) -> Result<UserProfile> {
        self.inner.loading.store(true, Ordering::SeqCst);
        let result = self.inner.api.register(input).await;
        self.inner.loading.store(false, Ordering::SeqCst);
        result.inspect_err(|error| tracing::error!(%error, "Registration failed"))
    }

    /// Fetch the current profile.
    ///
    /// No-op without an access token. A 401 triggers full logout and is
    /// swallowed (the session is simply anonymous afterwards); other
    /// failures leave the prior profile untouched and are returned.
    ///
    /// # Errors
    ///
    /// Returns the underlying error for non-401 failures.
    pub async fn fetch_profile(&self) -> Result<()> {
        if !self.inner.tokens.is_authenticated() {
            return Ok(());
        }

        match self.inner.api.profile().await {
            Ok(profile) => {
                *self.write_profile() = Some(profile);
                Ok(())
            }
            Err(ApiError::Unauthorized) => {
                self.logout();
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "Profile fetch failed, keeping prior state");
                Err(error)
            }
        }
    }

    /// Mint a new access token from the held refresh token.
    ///
    /// Returns `false` (after a full logout) when no refresh token is held
    /// or the exchange fails; on success only the access token changes.
    pub async fn refresh_access_token(&self) -> bool {
        let Some(refresh) = self.inner.tokens.refresh_token() else {
            self.logout();
            return false;
        };

        match self.inner.api.refresh(&refresh).await {
            Ok(token) => {
                if let Err(error) = self.inner.tokens.set_access(&token.access) {
                    tracing::warn!(%error, "Failed to persist refreshed access token");
                }
                true
            }
            Err(error) => {
                tracing::error!(%error, "Token refresh failed");
                self.logout();
                false
            }
        }
    }

    /// Update the whitelisted profile fields and shallow-merge the response
    /// into the held profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the request fails.
    pub async fn update_profile(&self, input: &ProfileUpdateInput) -> Result<UserProfile> {
        self.inner.loading.store(true, Ordering::SeqCst);
        let result = self.inner.api.update_profile(input).await;
        self.inner.loading.store(false, Ordering::SeqCst);

        let updated = result.inspect_err(|error| tracing::error!(%error, "Profile update failed"))?;

        let merged = {
            let mut profile = self.write_profile();
            let merged = match profile.take() {
                Some(current) => current.merged_with(updated),
                None => updated,
            };
            *profile = Some(merged.clone());
            merged
        };

        Ok(merged)
    }

    /// Restore a persisted session at startup: fetch the profile if a
    /// token survived. Best-effort; failures are logged, never fatal.
    pub async fn initialize(&self) {
        if !self.inner.tokens.is_authenticated() {
            return;
        }
        if let Err(error) = self.fetch_profile().await {
            tracing::warn!(%error, "Session restore could not fetch profile");
        }
    }

    /// Clear profile and tokens, returning to anonymous.
    pub fn logout(&self) {
        *self.write_profile() = None;
        self.inner.tokens.clear();
    }

    /// The held profile, gated on token presence.
    ///
    /// When the transport tore the session down (401 on any call), the
    /// tokens are already gone and this correctly reports `None` even
    /// before the next explicit logout.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        if !self.inner.tokens.is_authenticated() {
            return None;
        }
        self.read_profile().clone()
    }

    /// Authenticated means: token held and profile loaded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.profile().is_some()
    }

    /// Whether a login/register/update call is in flight (status only).
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// The underlying token store.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    fn read_profile(&self) -> std::sync::RwLockReadGuard<'_, Option<UserProfile>> {
        self.inner
            .profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_profile(&self) -> std::sync::RwLockWriteGuard<'_, Option<UserProfile>> {
        self.inner
            .profile
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("state.json"));
        let tokens = TokenStore::new(store.clone());

        assert!(!tokens.is_authenticated());
        tokens.set_tokens("A1", "R1").unwrap();
        assert!(tokens.is_authenticated());
        assert_eq!(tokens.bearer().as_deref(), Some("A1"));
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("A1"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[test]
    fn test_token_store_restores_persisted_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        TokenStore::new(LocalStore::open(&path))
            .set_tokens("A1", "R1")
            .unwrap();

        let restored = TokenStore::new(LocalStore::open(&path));
        assert!(restored.is_authenticated());
        assert_eq!(restored.refresh_token().as_deref(), Some("R1"));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("state.json"));
        let tokens = TokenStore::new(store.clone());

        tokens.set_tokens("A1", "R1").unwrap();
        tokens.clear();

        assert!(!tokens.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY), None);
    }

    #[test]
    fn test_set_access_leaves_refresh_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("state.json"));
        let tokens = TokenStore::new(store.clone());

        tokens.set_tokens("A1", "R1").unwrap();
        tokens.set_access("A2").unwrap();

        assert_eq!(tokens.bearer().as_deref(), Some("A2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("R1"));
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("A2"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = TokenStore::new(LocalStore::open(&dir.path().join("state.json")));
        tokens.set_tokens("A1", "R1").unwrap();

        let debug = format!("{tokens:?}");
        assert!(!debug.contains("A1"));
        assert!(!debug.contains("R1"));
        assert!(debug.contains("REDACTED"));
    }
}
