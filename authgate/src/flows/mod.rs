mod browser;
mod errors;
mod id_token;
mod native;
mod oauth;
mod password;
mod pending;
mod types;

pub use browser::{BrowserOutcome, ExternalBrowser};
pub use errors::FlowError;
pub use id_token::IdTokenFlow;
pub use native::{NativeIdentity, NativeSignIn, NativeSignInError};
pub use oauth::OAuthFlow;
pub use password::PasswordFlow;
pub use types::FlowOutcome;
