mod errors;
mod rest;
mod storage;
mod types;

pub use errors::{AuthClientError, StorageError};
pub use rest::{ClientOptions, RestAuthClient};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use types::{
    AuthChangeCallback, AuthChangeEvent, AuthClient, AuthSession, AuthSubscription, AuthUser,
    ChangeListeners, OAuthProvider, UserMetadata,
};
