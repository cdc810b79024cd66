mod guard;
mod store;
mod types;

pub use guard::{ScreenStack, active_stack, is_reachable};
pub use store::{SessionCallback, SessionStore, SessionSubscription};
pub use types::{Session, SessionState};
