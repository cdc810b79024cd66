use std::sync::Arc;

use crate::client::AuthClient;
use crate::config::{Config, SignInMethod};

use super::errors::FlowError;
use super::pending::PendingFlow;
use super::types::FlowOutcome;

const VALIDATION_MESSAGE: &str = "Please enter both email and password.";
const SIGN_UP_FALLBACK: &str = "Failed to create account.";
const SIGN_UP_PREFIX: &str = "Sign-up failed: ";
const SIGN_IN_FALLBACK: &str = "Email sign-in failed.";
const SIGN_IN_PREFIX: &str = "Email sign-in failed: ";
const RESEND_MISSING_EMAIL: &str = "Email is missing. Please go back and sign up again.";
const RESEND_FALLBACK: &str = "Failed to resend confirmation email.";
const RESEND_PREFIX: &str = "Resend failed: ";

/// Email-and-password sign-up, sign-in, and confirmation resend.
///
/// Emails are trimmed before validation and before every backend call;
/// passwords pass through untouched. One attempt at a time per instance.
pub struct PasswordFlow {
    config: Config,
    client: Arc<dyn AuthClient>,
    pending: PendingFlow,
}

impl PasswordFlow {
    pub fn new(config: Config, client: Arc<dyn AuthClient>) -> Self {
        Self {
            config,
            client,
            pending: PendingFlow::default(),
        }
    }

    /// Whether an attempt is currently in flight ("submitting" in the UI).
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Create an account and send the confirmation email. Success carries
    /// the trimmed email for the "check your inbox" screen; no session
    /// exists until the user confirms.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<FlowOutcome, FlowError> {
        self.check_config()?;
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FlowError::Validation(VALIDATION_MESSAGE.to_string()));
        }
        let _pending = self.pending.acquire()?;

        tracing::debug!("Signing up a new account");
        let redirect = self.config.redirect_target().as_url();
        self.client
            .password_sign_up(email, password, &redirect)
            .await
            .map_err(|e| FlowError::from_backend(e, SIGN_UP_FALLBACK, SIGN_UP_PREFIX))?;

        Ok(FlowOutcome::CheckEmail {
            email: email.to_string(),
        })
    }

    /// Authenticate with email and password. On success the session store
    /// picks up the new session through the adapter's change notification.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<FlowOutcome, FlowError> {
        self.check_config()?;
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FlowError::Validation(VALIDATION_MESSAGE.to_string()));
        }
        let _pending = self.pending.acquire()?;

        tracing::debug!("Signing in with password");
        self.client
            .password_sign_in(email, password)
            .await
            .map_err(|e| FlowError::from_backend(e, SIGN_IN_FALLBACK, SIGN_IN_PREFIX))?;

        Ok(FlowOutcome::Completed)
    }

    /// Send the signup confirmation email again, for users who lost the
    /// first one.
    pub async fn resend_confirmation(&self, email: &str) -> Result<FlowOutcome, FlowError> {
        self.check_config()?;
        let email = email.trim();
        if email.is_empty() {
            return Err(FlowError::Validation(RESEND_MISSING_EMAIL.to_string()));
        }
        let _pending = self.pending.acquire()?;

        tracing::debug!("Resending confirmation email");
        let redirect = self.config.redirect_target().as_url();
        self.client
            .resend_confirmation(email, &redirect)
            .await
            .map_err(|e| FlowError::from_backend(e, RESEND_FALLBACK, RESEND_PREFIX))?;

        Ok(FlowOutcome::Completed)
    }

    fn check_config(&self) -> Result<(), FlowError> {
        let missing = self.config.missing_required(SignInMethod::Password);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FlowError::MissingConfig { keys: missing })
        }
    }
}
