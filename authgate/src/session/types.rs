use crate::client::AuthSession;

/// A user is authenticated this process. Minimal identity: the label shown
/// for the account (email or display name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub label: String,
}

impl Session {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl From<&AuthSession> for Session {
    fn from(session: &AuthSession) -> Self {
        Self {
            label: session.label(),
        }
    }
}

/// Authentication state of the process. `Unknown` only exists before the
/// first startup resolution; afterwards the store moves strictly between
/// `Authenticated` and `Unauthenticated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}
