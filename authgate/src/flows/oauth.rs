use std::sync::Arc;

use crate::callback::{CallbackCredentials, CallbackError, parse_callback_url};
use crate::client::{AuthClient, OAuthProvider};
use crate::config::{Config, SignInMethod};

use super::browser::{BrowserOutcome, ExternalBrowser};
use super::errors::FlowError;
use super::pending::PendingFlow;
use super::types::FlowOutcome;

const MISSING_AUTHORIZE_URL: &str = "Backend did not return an OAuth URL.";
const SESSION_FALLBACK: &str = "Failed to create session.";
const CALLBACK_PREFIX: &str = "OAuth callback failed: ";

/// Browser-redirect OAuth: obtain the authorization URL, send the user out
/// through the external browser, and turn the redirect that comes back into
/// a session.
///
/// The redirect can also arrive as a deep link while the browser wait is
/// still parked; [`handle_callback_url`](Self::handle_callback_url) accepts
/// it on that path. Both paths may deliver the same URL: the code exchange
/// consumes the stored verifier, so the duplicate is rejected by the backend
/// and the first session stays intact.
pub struct OAuthFlow {
    config: Config,
    client: Arc<dyn AuthClient>,
    browser: Arc<dyn ExternalBrowser>,
    pending: PendingFlow,
}

impl OAuthFlow {
    pub fn new(
        config: Config,
        client: Arc<dyn AuthClient>,
        browser: Arc<dyn ExternalBrowser>,
    ) -> Self {
        Self {
            config,
            client,
            browser,
            pending: PendingFlow::default(),
        }
    }

    /// Whether an attempt is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Run the full redirect round trip for `provider`. Cancelling or
    /// dismissing the browser ends the attempt silently.
    pub async fn sign_in(&self, provider: OAuthProvider) -> Result<FlowOutcome, FlowError> {
        let missing = self.config.missing_required(SignInMethod::OAuthRedirect);
        if !missing.is_empty() {
            return Err(FlowError::MissingConfig { keys: missing });
        }
        let _pending = self.pending.acquire()?;

        let prefix = format!("{} OAuth failed: ", provider.display_name());
        let redirect = self.config.redirect_target().as_url();
        let auth_url = self
            .client
            .start_oauth(provider, &redirect)
            .await
            .map_err(|e| FlowError::from_backend(e, SESSION_FALLBACK, &prefix))?;
        if auth_url.trim().is_empty() {
            return Err(FlowError::Backend(MISSING_AUTHORIZE_URL.to_string()));
        }

        tracing::info!(provider = %provider, "Opening external browser for sign-in");
        match self.browser.authenticate(&auth_url, &redirect).await {
            BrowserOutcome::Success(url) => self.complete_from_url(&url, &prefix).await,
            BrowserOutcome::Cancel | BrowserOutcome::Dismiss => {
                tracing::debug!(provider = %provider, "Browser sign-in dismissed by user");
                Ok(FlowOutcome::Cancelled)
            }
        }
    }

    /// Deep-link entry: resolve a redirect URL delivered by the OS link
    /// listener and complete the session from it. Not gated by the pending
    /// guard; it finishes an attempt rather than starting one.
    pub async fn handle_callback_url(&self, url: &str) -> Result<FlowOutcome, FlowError> {
        self.complete_from_url(url, CALLBACK_PREFIX).await
    }

    async fn complete_from_url(&self, url: &str, prefix: &str) -> Result<FlowOutcome, FlowError> {
        let credentials = match parse_callback_url(url) {
            Ok(credentials) => credentials,
            Err(error @ (CallbackError::Provider(_) | CallbackError::NoCredentials)) => {
                return Err(FlowError::Backend(error.to_string()));
            }
            Err(error @ CallbackError::InvalidUrl(_)) => {
                return Err(FlowError::Unexpected(format!("{prefix}{error}")));
            }
        };

        match credentials {
            CallbackCredentials::Code(code) => self.client.exchange_code(&code).await,
            CallbackCredentials::Tokens {
                access_token,
                refresh_token,
            } => {
                self.client
                    .set_session_from_tokens(&access_token, &refresh_token)
                    .await
            }
        }
        .map_err(|e| FlowError::from_backend(e, SESSION_FALLBACK, prefix))?;

        Ok(FlowOutcome::Completed)
    }
}
