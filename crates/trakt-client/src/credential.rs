//! Shared credential store for one client instance.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::AccessToken;

/// Access and refresh token, always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<AccessToken> for Credential {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        }
    }
}

impl From<&AccessToken> for Credential {
    fn from(token: &AccessToken) -> Self {
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
        }
    }
}

/// Outcome of the most recent refresh, kept behind the refresh lock so that
/// requests queued on the lock can share it.
#[derive(Debug, Default)]
pub struct RefreshRecord {
    access_token: Option<String>,
}

impl RefreshRecord {
    /// Access token produced by the last refresh, `None` if it failed.
    pub fn last_access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

/// Client identity and current token pair.
///
/// Shared by reference (`Arc`) between the header injector and the
/// reauthenticator. Refreshes are serialized through [`CredentialState::refresh_guard`].
#[derive(Debug)]
pub struct CredentialState {
    client_id: RwLock<String>,
    client_secret: String,
    redirect_uri: String,
    credential: RwLock<Option<Credential>>,
    refresh_lock: Mutex<RefreshRecord>,
    refresh_generation: AtomicU64,
}

impl CredentialState {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id: RwLock::new(client_id),
            client_secret,
            redirect_uri,
            credential: RwLock::new(None),
            refresh_lock: Mutex::new(RefreshRecord::default()),
            refresh_generation: AtomicU64::new(0),
        }
    }

    pub async fn client_id(&self) -> String {
        self.client_id.read().await.clone()
    }

    pub async fn set_client_id(&self, client_id: String) {
        *self.client_id.write().await = client_id;
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    pub async fn set_credential(&self, credential: Option<Credential>) {
        *self.credential.write().await = credential;
    }

    /// Current access token, or an empty string when none is set.
    pub async fn access_token(&self) -> String {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
            .unwrap_or_default()
    }

    /// Current refresh token, or an empty string when none is set.
    pub async fn refresh_token(&self) -> String {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|c| c.refresh_token.clone())
            .unwrap_or_default()
    }

    /// Overwrite both tokens with a token endpoint result.
    pub async fn apply(&self, token: &AccessToken) {
        *self.credential.write().await = Some(Credential::from(token));
    }

    /// Exclusive guard held for the duration of one refresh.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, RefreshRecord> {
        self.refresh_lock.lock().await
    }

    /// Number of refresh attempts finished so far, successful or not.
    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation.load(Ordering::Acquire)
    }

    /// Record the outcome of a refresh attempt while holding its guard.
    pub fn finish_refresh(&self, record: &mut RefreshRecord, access_token: Option<String>) {
        record.access_token = access_token;
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);
    }
}
