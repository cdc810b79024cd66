use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use url::Url;

use crate::utils::{base64url_encode, gen_random_string};

use super::errors::AuthClientError;
use super::storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
use super::types::{
    AuthChangeCallback, AuthChangeEvent, AuthClient, AuthSession, AuthSubscription, AuthUser,
    ChangeListeners, ErrorBody, OAuthProvider, TokenResponse,
};

const AUTH_PATH: &str = "auth/v1";
const DEFAULT_STORAGE_KEY: &str = "authgate-session";
const PKCE_VERIFIER_BYTES: usize = 32;

/// Deployment-target knobs for [`RestAuthClient`]. The contract is identical
/// for every target; only where the session persists differs.
pub struct ClientOptions {
    pub storage: Arc<dyn SessionStorage>,
    pub storage_key: String,
}

impl ClientOptions {
    /// Browser-style target: the session lives for the process only.
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemorySessionStorage::new()),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Device-style target: the session survives restarts in a JSON file.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: Arc::new(FileSessionStorage::new(path)),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// HTTP implementation of [`AuthClient`] against a GoTrue-compatible auth
/// API: `apikey` header on every request, token grants under
/// `/auth/v1/token`, PKCE for the OAuth redirect flow.
pub struct RestAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    storage: Arc<dyn SessionStorage>,
    storage_key: String,
    session: Mutex<Option<AuthSession>>,
    listeners: ChangeListeners,
    // Serializes session-slot updates with their emissions so subscribers
    // observe changes in the order they were applied.
    change_order: Mutex<()>,
}

impl RestAuthClient {
    pub fn new(backend_url: &str, anon_key: &str) -> Result<Self, AuthClientError> {
        Self::with_options(backend_url, anon_key, ClientOptions::default())
    }

    pub fn with_options(
        backend_url: &str,
        anon_key: &str,
        options: ClientOptions,
    ) -> Result<Self, AuthClientError> {
        let parsed =
            Url::parse(backend_url).map_err(|e| AuthClientError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AuthClientError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            http: build_http_client(),
            base_url: backend_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            storage: options.storage,
            storage_key: options.storage_key,
            session: Mutex::new(None),
            listeners: ChangeListeners::new(),
            change_order: Mutex::new(()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{AUTH_PATH}{path}", self.base_url)
    }

    fn verifier_key(&self) -> String {
        format!("{}-code-verifier", self.storage_key)
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `session` current and notify subscribers, persisting it first
    /// best-effort.
    async fn install_session(&self, session: AuthSession) {
        match serde_json::to_string(&session) {
            Ok(serialized) => {
                if let Err(e) = self.storage.set_item(&self.storage_key, &serialized).await {
                    tracing::warn!("Failed to persist session: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize session: {e}"),
        }

        let _order = self
            .change_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *self.session_slot() = Some(session.clone());
        tracing::debug!("Session installed for {}", session.label());
        self.listeners
            .emit(AuthChangeEvent::SignedIn, Some(&session));
    }

    fn clear_session_and_notify(&self) {
        let _order = self
            .change_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let had_session = self.session_slot().take().is_some();
        if had_session {
            tracing::debug!("Session cleared");
        }
        self.listeners.emit(AuthChangeEvent::SignedOut, None);
    }

    async fn post_json(
        &self,
        url: String,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, AuthClientError> {
        self.http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthClientError::Transport(e.to_string()))
    }

    /// Parse a token-grant response into a session, installing it as
    /// current.
    async fn accept_session_response(
        &self,
        response: reqwest::Response,
    ) -> Result<(), AuthClientError> {
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let body = response
            .text()
            .await
            .map_err(|e| AuthClientError::Transport(e.to_string()))?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthClientError::Serde(format!("Failed to deserialize token response: {e}")))?;
        self.install_session(AuthSession::from(parsed)).await;
        Ok(())
    }

    async fn restore_persisted_session(&self) -> Result<Option<AuthSession>, AuthClientError> {
        let Some(raw) = self.storage.get_item(&self.storage_key).await? else {
            return Ok(None);
        };

        let session: AuthSession = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                // Unreadable persisted state is dropped, not fatal.
                tracing::warn!("Discarding unreadable persisted session: {e}");
                let _ = self.storage.remove_item(&self.storage_key).await;
                return Ok(None);
            }
        };

        if session.is_expired() {
            tracing::info!("Persisted session expired, discarding");
            let _ = self.storage.remove_item(&self.storage_key).await;
            return Ok(None);
        }

        tracing::debug!("Restored persisted session for {}", session.label());
        *self.session_slot() = Some(session.clone());
        Ok(Some(session))
    }
}

#[async_trait]
impl AuthClient for RestAuthClient {
    async fn password_sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_target: &str,
    ) -> Result<(), AuthClientError> {
        tracing::debug!("Password sign-up for {email}");
        let mut url =
            Url::parse(&self.endpoint("/signup")).map_err(|e| AuthClientError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("redirect_to", redirect_target);

        let response = self
            .post_json(url.to_string(), json!({"email": email, "password": password}))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        // Account created, confirmation pending. Any session in the body is
        // ignored; authentication happens after the user confirms.
        Ok(())
    }

    async fn password_sign_in(&self, email: &str, password: &str) -> Result<(), AuthClientError> {
        tracing::debug!("Password sign-in for {email}");
        let response = self
            .post_json(
                self.endpoint("/token?grant_type=password"),
                json!({"email": email, "password": password}),
            )
            .await?;
        self.accept_session_response(response).await
    }

    async fn resend_confirmation(
        &self,
        email: &str,
        redirect_target: &str,
    ) -> Result<(), AuthClientError> {
        tracing::debug!("Resending confirmation email to {email}");
        let mut url =
            Url::parse(&self.endpoint("/resend")).map_err(|e| AuthClientError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("redirect_to", redirect_target);

        let response = self
            .post_json(url.to_string(), json!({"type": "signup", "email": email}))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn start_oauth(
        &self,
        provider: OAuthProvider,
        redirect_target: &str,
    ) -> Result<String, AuthClientError> {
        let verifier = gen_random_string(PKCE_VERIFIER_BYTES)?;
        let challenge = base64url_encode(Sha256::digest(verifier.as_bytes()).to_vec())?;

        // The verifier must survive until the redirect comes back, possibly
        // in a fresh process on device targets.
        self.storage.set_item(&self.verifier_key(), &verifier).await?;

        let mut url = Url::parse(&self.endpoint("/authorize"))
            .map_err(|e| AuthClientError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_target)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256");

        let auth_url = url.to_string();
        tracing::debug!("Authorization URL: {auth_url}");
        Ok(auth_url)
    }

    async fn exchange_code(&self, code: &str) -> Result<(), AuthClientError> {
        let verifier = self
            .storage
            .get_item(&self.verifier_key())
            .await?
            .ok_or(AuthClientError::MissingPkceVerifier)?;

        tracing::debug!("Exchanging authorization code");
        let response = self
            .post_json(
                self.endpoint("/token?grant_type=pkce"),
                json!({"auth_code": code, "code_verifier": verifier}),
            )
            .await?;
        self.accept_session_response(response).await?;

        // Consumed on success only; a rejected code may be retried with a
        // fresh authorization round trip reusing nothing.
        let _ = self.storage.remove_item(&self.verifier_key()).await;
        Ok(())
    }

    async fn set_session_from_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AuthClientError> {
        tracing::debug!("Installing session from token pair");
        let response = self
            .http
            .get(self.endpoint("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let body = response
            .text()
            .await
            .map_err(|e| AuthClientError::Transport(e.to_string()))?;
        let user: AuthUser = serde_json::from_str(&body)
            .map_err(|e| AuthClientError::Serde(format!("Failed to deserialize user: {e}")))?;

        self.install_session(AuthSession {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: None,
            user,
        })
        .await;
        Ok(())
    }

    async fn sign_in_with_id_token(
        &self,
        provider: OAuthProvider,
        id_token: &str,
    ) -> Result<(), AuthClientError> {
        tracing::debug!("Identity-token sign-in via {}", provider.as_str());
        let response = self
            .post_json(
                self.endpoint("/token?grant_type=id_token"),
                json!({"provider": provider.as_str(), "id_token": id_token}),
            )
            .await?;
        self.accept_session_response(response).await
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, AuthClientError> {
        if let Some(session) = self.session_slot().clone() {
            return Ok(Some(session));
        }
        self.restore_persisted_session().await
    }

    fn on_auth_state_change(&self, callback: AuthChangeCallback) -> AuthSubscription {
        self.listeners.subscribe(callback)
    }

    async fn sign_out(&self) {
        let access_token = self
            .session_slot()
            .as_ref()
            .map(|s| s.access_token.clone());

        if let Some(token) = access_token {
            let result = self
                .http
                .post(self.endpoint("/logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!("Backend sign-out rejected: {}", response.status());
                }
                Err(e) => tracing::warn!("Backend sign-out failed: {e}"),
                Ok(_) => {}
            }
        }

        if let Err(e) = self.storage.remove_item(&self.storage_key).await {
            tracing::warn!("Failed to clear persisted session: {e}");
        }
        let _ = self.storage.remove_item(&self.verifier_key()).await;

        self.clear_session_and_notify();
    }
}

fn build_http_client() -> reqwest::Client {
    // No request timeout: a hung backend call stays pending until the user
    // abandons it, never cancelled from here.
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .expect("Failed to create reqwest client")
}

async fn error_from_response(response: reqwest::Response) -> AuthClientError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return AuthClientError::Transport(e.to_string()),
    };

    if status.is_client_error() {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
            return AuthClientError::Rejected {
                status: status.as_u16(),
                message: parsed.message().unwrap_or_default(),
                error_code: parsed.code(),
            };
        }
    }

    tracing::debug!("Unexpected backend response {status}: {body}");
    AuthClientError::UnexpectedResponse(format!("status {status}"))
}
