use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthClientError;

/// Identity providers reachable through the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Apple,
}

impl OAuthProvider {
    /// Wire name the backend expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }

    /// Human-readable name for user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Apple => "Apple",
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = AuthClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            other => Err(AuthClientError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-issued session: bearer tokens plus the user they belong to.
/// This is also the persistence format the session storage holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds after which the access token is stale.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Identity label shown for this session: email, else a display name
    /// from the profile metadata, else a fixed placeholder.
    pub fn label(&self) -> String {
        self.user
            .email
            .clone()
            .or_else(|| self.user.user_metadata.name.clone())
            .or_else(|| self.user.user_metadata.full_name.clone())
            .unwrap_or_else(|| "authenticated-user".to_string())
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now().timestamp() >= at,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Body of a successful token-grant response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
    #[serde(default)]
    pub(crate) expires_in: Option<i64>,
    #[serde(default)]
    pub(crate) expires_at: Option<i64>,
    pub(crate) user: AuthUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(response: TokenResponse) -> Self {
        // Prefer the absolute timestamp; fall back to now + expires_in.
        let expires_at = response.expires_at.or_else(|| {
            response
                .expires_in
                .map(|secs| (Utc::now() + Duration::seconds(secs)).timestamp())
        });
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            user: response.user,
        }
    }
}

/// Error body shapes the backend emits. Field names vary by endpoint
/// generation, so everything is optional and read in preference order.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) msg: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) error_description: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) error_code: Option<String>,
}

impl ErrorBody {
    pub(crate) fn message(&self) -> Option<String> {
        self.msg
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
    }

    pub(crate) fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| self.error.clone())
    }
}

/// What changed when a session-change notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
}

pub type AuthChangeCallback = Box<dyn Fn(AuthChangeEvent, Option<&AuthSession>) + Send + Sync>;

type Registry = Mutex<Vec<(Uuid, Arc<AuthChangeCallback>)>>;

/// Subscription registry an [`AuthClient`] implementation embeds to manage
/// its change listeners. Emission walks listeners in registration order and
/// delivers every change; nothing is coalesced.
#[derive(Clone, Default)]
pub struct ChangeListeners {
    inner: Arc<Registry>,
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: AuthChangeCallback) -> AuthSubscription {
        let id = Uuid::new_v4();
        self.lock().push((id, Arc::new(callback)));
        AuthSubscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, event: AuthChangeEvent, session: Option<&AuthSession>) {
        // Snapshot first so a callback may subscribe or unsubscribe without
        // deadlocking; it takes effect from the next emission.
        let snapshot: Vec<Arc<AuthChangeCallback>> =
            self.lock().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in snapshot {
            callback(event, session);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Uuid, Arc<AuthChangeCallback>)>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for one registered change listener. Dropping it, or calling
/// [`unsubscribe`](Self::unsubscribe), removes the listener.
pub struct AuthSubscription {
    id: Uuid,
    registry: Weak<Registry>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("id", &self.id)
            .finish()
    }
}

/// One stable async interface over the external auth backend, identical for
/// every deployment target. Orchestrators and the session store depend only
/// on this trait.
#[async_trait]
pub trait AuthClient: Send + Sync + 'static {
    /// Create an account and dispatch the confirmation email. Does not
    /// authenticate; the user confirms out of band.
    async fn password_sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_target: &str,
    ) -> Result<(), AuthClientError>;

    /// Authenticate with email and password. On success the new session
    /// becomes current and subscribers are notified.
    async fn password_sign_in(&self, email: &str, password: &str) -> Result<(), AuthClientError>;

    async fn resend_confirmation(
        &self,
        email: &str,
        redirect_target: &str,
    ) -> Result<(), AuthClientError>;

    /// Build the authorization URL for an OAuth redirect flow. No network
    /// call and no sign-in yet; the caller opens the URL externally and
    /// captures the redirect.
    async fn start_oauth(
        &self,
        provider: OAuthProvider,
        redirect_target: &str,
    ) -> Result<String, AuthClientError>;

    /// Complete a code-based OAuth flow, producing a current session.
    async fn exchange_code(&self, code: &str) -> Result<(), AuthClientError>;

    /// Complete a token-based OAuth flow, producing a current session.
    async fn set_session_from_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AuthClientError>;

    /// Complete a native-SDK flow with a provider identity token.
    async fn sign_in_with_id_token(
        &self,
        provider: OAuthProvider,
        id_token: &str,
    ) -> Result<(), AuthClientError>;

    /// Current session, restoring a persisted one at startup if needed.
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthClientError>;

    /// Register for session-change notifications. The returned handle
    /// unsubscribes on drop.
    fn on_auth_state_change(&self, callback: AuthChangeCallback) -> AuthSubscription;

    /// End the current session. Best-effort against the backend; the local
    /// session is always cleared and subscribers notified.
    async fn sign_out(&self);
}
