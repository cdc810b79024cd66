use std::sync::Arc;

use crate::client::{AuthClient, OAuthProvider};
use crate::config::{Config, SignInMethod};

use super::errors::FlowError;
use super::native::{NativeSignIn, NativeSignInError};
use super::pending::PendingFlow;
use super::types::FlowOutcome;

const GOOGLE_MISSING_TOKEN: &str = "Google idToken was not returned.";
const APPLE_MISSING_TOKEN: &str = "Apple did not return an identity token.";
const APPLE_UNAVAILABLE: &str = "Apple Sign In is not available on this device.";

/// Native-SDK sign-in: run the platform SDK, take its identity token to the
/// backend's token grant. One flow instance per provider; the SDK seam
/// decides which.
pub struct IdTokenFlow {
    config: Config,
    client: Arc<dyn AuthClient>,
    native: Arc<dyn NativeSignIn>,
    pending: PendingFlow,
}

impl IdTokenFlow {
    pub fn new(config: Config, client: Arc<dyn AuthClient>, native: Arc<dyn NativeSignIn>) -> Self {
        Self {
            config,
            client,
            native,
            pending: PendingFlow::default(),
        }
    }

    pub fn provider(&self) -> OAuthProvider {
        self.native.provider()
    }

    /// Whether an attempt is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Run the SDK prompt and, with its token, the backend grant. An SDK
    /// cancellation ends the attempt silently.
    pub async fn sign_in(&self) -> Result<FlowOutcome, FlowError> {
        let provider = self.native.provider();
        let method = match provider {
            OAuthProvider::Google => SignInMethod::NativeGoogle,
            OAuthProvider::Apple => SignInMethod::NativeApple,
        };
        let missing = self.config.missing_required(method);
        if !missing.is_empty() {
            return Err(FlowError::MissingConfig { keys: missing });
        }
        let _pending = self.pending.acquire()?;

        tracing::info!(provider = %provider, "Starting native sign-in");
        let identity = match self.native.sign_in().await {
            Ok(identity) => identity,
            Err(NativeSignInError::Cancelled) => {
                tracing::debug!(provider = %provider, "Native sign-in cancelled by user");
                return Ok(FlowOutcome::Cancelled);
            }
            Err(NativeSignInError::Unavailable(message)) => {
                return Err(FlowError::Backend(unavailable_message(provider, message)));
            }
            Err(NativeSignInError::Sdk(message)) => {
                return Err(FlowError::Backend(surface(message, fallback(provider))));
            }
        };

        let token = identity
            .identity_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| FlowError::Backend(missing_token_message(provider).to_string()))?;

        self.client
            .sign_in_with_id_token(provider, &token)
            .await
            .map_err(|e| FlowError::from_backend(e, &fallback(provider), &prefix(provider)))?;

        Ok(FlowOutcome::Completed)
    }
}

fn fallback(provider: OAuthProvider) -> String {
    format!("{} sign-in failed.", provider.display_name())
}

fn prefix(provider: OAuthProvider) -> String {
    format!("{} sign-in failed: ", provider.display_name())
}

fn missing_token_message(provider: OAuthProvider) -> &'static str {
    match provider {
        OAuthProvider::Google => GOOGLE_MISSING_TOKEN,
        OAuthProvider::Apple => APPLE_MISSING_TOKEN,
    }
}

fn unavailable_message(provider: OAuthProvider, message: String) -> String {
    if !message.trim().is_empty() {
        return message;
    }
    match provider {
        OAuthProvider::Apple => APPLE_UNAVAILABLE.to_string(),
        OAuthProvider::Google => fallback(OAuthProvider::Google),
    }
}

fn surface(message: String, fallback: String) -> String {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}
