//! authgate - Client-side sign-in orchestration over a GoTrue-style backend
//!
//! This crate coordinates an app's authentication surface: password,
//! browser-redirect OAuth, and native-SDK sign-in flows, a process-wide
//! session store with ordered change notifications, and the route guard
//! that keys navigation off the session state.

mod callback;
mod client;
mod config;
mod flows;
mod session;
mod utils;

#[cfg(test)]
mod test_utils;

// Re-export the redirect callback resolver
pub use callback::{CallbackCredentials, CallbackError, parse_callback_url};

pub use client::{
    AuthChangeCallback, AuthChangeEvent, AuthClient, AuthClientError, AuthSession,
    AuthSubscription, AuthUser, ChangeListeners, ClientOptions, FileSessionStorage,
    MemorySessionStorage, OAuthProvider, RestAuthClient, SessionStorage, StorageError,
    UserMetadata,
};

pub use config::{
    Config, ENV_ANON_KEY, ENV_BACKEND_URL, ENV_GOOGLE_ANDROID_CLIENT_ID, ENV_GOOGLE_IOS_CLIENT_ID,
    ENV_GOOGLE_WEB_CLIENT_ID, Platform, RedirectTarget, SignInMethod,
};

pub use flows::{
    BrowserOutcome, ExternalBrowser, FlowError, FlowOutcome, IdTokenFlow, NativeIdentity,
    NativeSignIn, NativeSignInError, OAuthFlow, PasswordFlow,
};

pub use session::{
    ScreenStack, Session, SessionCallback, SessionState, SessionStore, SessionSubscription,
    active_stack, is_reachable,
};

pub use utils::UtilError;
