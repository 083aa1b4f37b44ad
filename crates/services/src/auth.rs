//! Shared credential state.
//!
//! One `AuthSession` is created at startup and cloned into every API client. It
//! owns the token pair and the signed-in user, mirrors every change into a
//! `CredentialStore`, and clears everything together on logout or when a refresh
//! is rejected.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Access/refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Everything that is persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuth {
    pub credentials: Option<Credentials>,
    pub user: Option<UserProfile>,
}

/// Backing store for credentials.
pub trait CredentialStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the store cannot be read.
    fn load(&self) -> Result<StoredAuth, AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::Store` if the store cannot be written.
    fn save(&self, auth: &StoredAuth) -> Result<(), AuthError>;

    /// # Errors
    ///
    /// Returns `AuthError::Store` if the store cannot be cleared.
    fn clear(&self) -> Result<(), AuthError>;
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: Mutex<StoredAuth>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new(initial: StoredAuth) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<StoredAuth, AuthError> {
        let guard = self.inner.lock().map_err(|_| AuthError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, auth: &StoredAuth) -> Result<(), AuthError> {
        let mut guard = self.inner.lock().map_err(|_| AuthError::Poisoned)?;
        *guard = auth.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self.inner.lock().map_err(|_| AuthError::Poisoned)?;
        *guard = StoredAuth::default();
        Ok(())
    }
}

/// Shared handle to the current credentials.
#[derive(Clone)]
pub struct AuthSession {
    state: Arc<Mutex<StoredAuth>>,
    store: Arc<dyn CredentialStore>,
}

impl AuthSession {
    /// Loads whatever the store holds.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the store cannot be read.
    pub fn init(store: Arc<dyn CredentialStore>) -> Result<Self, AuthError> {
        let initial = store.load()?;
        Ok(Self {
            state: Arc::new(Mutex::new(initial)),
            store,
        })
    }

    /// Session backed by an in-memory store seeded with `credentials`.
    #[must_use]
    pub fn in_memory(credentials: Option<Credentials>) -> Self {
        let initial = StoredAuth {
            credentials,
            user: None,
        };
        Self {
            state: Arc::new(Mutex::new(initial.clone())),
            store: Arc::new(InMemoryCredentialStore::new(initial)),
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError` if the store rejects the write.
    pub fn sign_in(
        &self,
        credentials: Credentials,
        user: Option<UserProfile>,
    ) -> Result<(), AuthError> {
        self.update(|state| {
            state.credentials = Some(credentials);
            state.user = user;
        })
    }

    /// Swaps in a freshly refreshed access token, keeping the refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the store rejects the write.
    pub fn replace_access(&self, access: String) -> Result<(), AuthError> {
        self.update(|state| {
            if let Some(credentials) = state.credentials.as_mut() {
                credentials.access = access;
            }
        })
    }

    /// Drops tokens and user together. A failing store is logged, memory is
    /// cleared regardless.
    pub fn clear(&self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = self.store.clear() {
            log::error!("failed to clear stored credentials: {err}");
        }
        *state = StoredAuth::default();
        log::info!("credentials cleared");
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read(|state| state.credentials.as_ref().map(|c| c.access.clone()))
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read(|state| state.credentials.as_ref().map(|c| c.refresh.clone()))
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.read(|state| state.user.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read(|state| Some(state.credentials.is_some()))
            .unwrap_or(false)
    }

    fn read<T>(&self, f: impl FnOnce(&StoredAuth) -> Option<T>) -> Option<T> {
        let state = self.state.lock().ok()?;
        f(&state)
    }

    fn update(&self, f: impl FnOnce(&mut StoredAuth)) -> Result<(), AuthError> {
        let mut state = self.state.lock().map_err(|_| AuthError::Poisoned)?;
        let mut next = state.clone();
        f(&mut next);
        self.store.save(&next)?;
        *state = next;
        Ok(())
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
