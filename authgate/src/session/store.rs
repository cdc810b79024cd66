use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use uuid::Uuid;

use crate::client::{AuthClient, AuthSession, AuthSubscription};

use super::types::{Session, SessionState};

pub type SessionCallback = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Single source of truth for "is a user currently authenticated".
///
/// The store owns the one live [`SessionState`] for the process. It derives
/// it from the auth client: a startup read resolves `Unknown`, after which
/// every backend change notification moves the state, in emission order and
/// without coalescing. Cloning the store clones a handle to the same state.
///
/// Sign-out clears the local state synchronously before the backend call, so
/// subscribers may observe `Unauthenticated` twice: once from the local
/// clear, once from the backend's own notification.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    client: Arc<dyn AuthClient>,
    state: Mutex<SessionState>,
    subscribers: Mutex<Vec<(Uuid, Arc<SessionCallback>)>>,
    // Serializes state updates with their deliveries.
    delivery_order: Mutex<()>,
    client_subscription: Mutex<Option<AuthSubscription>>,
}

impl SessionStore {
    /// Wire a store to `client` and resolve the startup session. The change
    /// subscription is registered before the startup read so a notification
    /// landing mid-read is not missed; if one arrives first, it wins and the
    /// read result is discarded.
    pub async fn connect(client: Arc<dyn AuthClient>) -> Self {
        let inner = Arc::new(StoreInner {
            client: client.clone(),
            state: Mutex::new(SessionState::Unknown),
            subscribers: Mutex::new(Vec::new()),
            delivery_order: Mutex::new(()),
            client_subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = client.on_auth_state_change(Box::new(move |_event, session| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_backend_change(session);
            }
        }));
        *inner
            .client_subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        match client.current_session().await {
            Ok(initial) => inner.resolve_startup(initial),
            Err(e) => {
                tracing::warn!("Startup session read failed: {e}");
                inner.resolve_startup(None);
            }
        }

        Self { inner }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state_snapshot()
    }

    /// Register `callback` and deliver the current state to it before
    /// returning; afterwards it receives every state the store moves
    /// through. The handle unsubscribes on drop.
    pub fn subscribe(&self, callback: SessionCallback) -> SessionSubscription {
        let id = Uuid::new_v4();
        let callback = Arc::new(callback);
        self.inner
            .lock_subscribers()
            .push((id, callback.clone()));
        callback(&self.inner.state_snapshot());
        SessionSubscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Clear the local session, then end the backend session best-effort.
    /// The state is `Unauthenticated` when this returns, whatever the
    /// backend said.
    pub async fn sign_out(&self) {
        tracing::info!("Signing out");
        self.inner.transition(SessionState::Unauthenticated);
        self.inner.client.sign_out().await;
    }
}

impl StoreInner {
    fn state_snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    fn apply_backend_change(&self, session: Option<&AuthSession>) {
        let new_state = match session {
            Some(session) => SessionState::Authenticated(Session::from(session)),
            None => SessionState::Unauthenticated,
        };
        self.transition(new_state);
    }

    fn resolve_startup(&self, initial: Option<AuthSession>) {
        let resolved = match initial.as_ref() {
            Some(session) => SessionState::Authenticated(Session::from(session)),
            None => SessionState::Unauthenticated,
        };

        let _order = self.lock_order();
        {
            let mut state = self.lock_state();
            if *state != SessionState::Unknown {
                tracing::debug!("Startup session read superseded by a change notification");
                return;
            }
            *state = resolved.clone();
        }
        tracing::debug!("Startup session resolved: authenticated={}", resolved.is_authenticated());
        self.deliver(&resolved);
    }

    /// Apply a state and deliver it. Every call delivers; equal consecutive
    /// states are two notifications, as the backend emitted them.
    fn transition(&self, new_state: SessionState) {
        let _order = self.lock_order();
        *self.lock_state() = new_state.clone();
        self.deliver(&new_state);
    }

    fn deliver(&self, state: &SessionState) {
        let snapshot: Vec<Arc<SessionCallback>> = self
            .lock_subscribers()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(state);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<(Uuid, Arc<SessionCallback>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_order(&self) -> MutexGuard<'_, ()> {
        self.delivery_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for one store subscriber. Dropping it, or calling
/// [`unsubscribe`](Self::unsubscribe), removes the subscriber.
pub struct SessionSubscription {
    id: Uuid,
    store: Weak<StoreInner>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn remove(&self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .lock_subscribers()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("id", &self.id)
            .finish()
    }
}
