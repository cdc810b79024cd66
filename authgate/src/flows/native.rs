use async_trait::async_trait;
use thiserror::Error;

use crate::client::OAuthProvider;

/// Identity material a native sign-in SDK hands back on success.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeIdentity {
    /// Provider-signed identity token for the backend token grant. Absent
    /// when the SDK authenticated but withheld the token.
    pub identity_token: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NativeSignInError {
    /// The user backed out of the SDK's UI.
    #[error("sign-in cancelled")]
    Cancelled,
    /// The SDK cannot run on this device or OS.
    #[error("{0}")]
    Unavailable(String),
    /// Any other SDK failure.
    #[error("{0}")]
    Sdk(String),
}

/// Native-SDK sign-in seam (Google Sign-In, Sign in with Apple).
/// Availability and Play Services checks live behind this trait; they
/// surface as [`NativeSignInError::Unavailable`] with the SDK's message.
#[async_trait]
pub trait NativeSignIn: Send + Sync + 'static {
    /// Provider this SDK authenticates against. Selects the token-grant
    /// provider name and the user-facing message set.
    fn provider(&self) -> OAuthProvider;

    async fn sign_in(&self) -> Result<NativeIdentity, NativeSignInError>;
}
