//! Test doubles shared by the session and flow tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{
    AuthChangeCallback, AuthChangeEvent, AuthClient, AuthClientError, AuthSession,
    AuthSubscription, AuthUser, ChangeListeners, OAuthProvider, UserMetadata,
};

/// Session carrying `email` and fresh-looking tokens.
pub(crate) fn test_auth_session(email: &str) -> AuthSession {
    AuthSession {
        access_token: format!("access-{email}"),
        refresh_token: format!("refresh-{email}"),
        expires_at: Some(chrono::Utc::now().timestamp() + 3600),
        user: AuthUser {
            id: "11111111-2222-3333-4444-555555555555".to_string(),
            email: Some(email.to_string()),
            user_metadata: UserMetadata::default(),
        },
    }
}

/// One adapter invocation with the arguments it received, in call order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RecordedCall {
    PasswordSignUp {
        email: String,
        password: String,
        redirect_target: String,
    },
    PasswordSignIn {
        email: String,
        password: String,
    },
    ResendConfirmation {
        email: String,
        redirect_target: String,
    },
    StartOAuth {
        provider: OAuthProvider,
        redirect_target: String,
    },
    ExchangeCode {
        code: String,
    },
    SetSessionFromTokens {
        access_token: String,
        refresh_token: String,
    },
    SignInWithIdToken {
        provider: OAuthProvider,
        id_token: String,
    },
    CurrentSession,
    SignOut,
}

impl RecordedCall {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::PasswordSignUp { .. } => "password_sign_up",
            Self::PasswordSignIn { .. } => "password_sign_in",
            Self::ResendConfirmation { .. } => "resend_confirmation",
            Self::StartOAuth { .. } => "start_oauth",
            Self::ExchangeCode { .. } => "exchange_code",
            Self::SetSessionFromTokens { .. } => "set_session_from_tokens",
            Self::SignInWithIdToken { .. } => "sign_in_with_id_token",
            Self::CurrentSession => "current_session",
            Self::SignOut => "sign_out",
        }
    }
}

/// Scriptable [`AuthClient`]: every operation records its call and returns a
/// configured result. Successful session-producing operations emit
/// `SignedIn` with [`session_to_emit`](Self::session_to_emit), and
/// `sign_out` emits `SignedOut`, mirroring the real adapter's notification
/// behavior.
pub(crate) struct MockAuthClient {
    pub(crate) calls: Mutex<Vec<RecordedCall>>,
    pub(crate) password_sign_up_result: Mutex<Result<(), AuthClientError>>,
    pub(crate) password_sign_in_result: Mutex<Result<(), AuthClientError>>,
    pub(crate) resend_confirmation_result: Mutex<Result<(), AuthClientError>>,
    pub(crate) start_oauth_result: Mutex<Result<String, AuthClientError>>,
    pub(crate) exchange_code_result: Mutex<Result<(), AuthClientError>>,
    pub(crate) set_session_from_tokens_result: Mutex<Result<(), AuthClientError>>,
    pub(crate) sign_in_with_id_token_result: Mutex<Result<(), AuthClientError>>,
    pub(crate) current_session_result: Mutex<Result<Option<AuthSession>, AuthClientError>>,
    /// Session emitted after a successful session-producing call. `None`
    /// suppresses the emission.
    pub(crate) session_to_emit: Mutex<Option<AuthSession>>,
    /// When set, `current_session` emits this session as a `SignedIn`
    /// before returning, simulating a change racing the startup read.
    pub(crate) emit_during_current_session: Mutex<Option<AuthSession>>,
    listeners: ChangeListeners,
}

impl MockAuthClient {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            password_sign_up_result: Mutex::new(Ok(())),
            password_sign_in_result: Mutex::new(Ok(())),
            resend_confirmation_result: Mutex::new(Ok(())),
            start_oauth_result: Mutex::new(Ok(
                "https://auth.example.com/auth/v1/authorize?provider=google".to_string(),
            )),
            exchange_code_result: Mutex::new(Ok(())),
            set_session_from_tokens_result: Mutex::new(Ok(())),
            sign_in_with_id_token_result: Mutex::new(Ok(())),
            current_session_result: Mutex::new(Ok(None)),
            session_to_emit: Mutex::new(Some(test_auth_session("mock@example.com"))),
            emit_during_current_session: Mutex::new(None),
            listeners: ChangeListeners::new(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| call.name() == name).count()
    }

    /// Push a change notification to subscribers, as the backend would.
    pub(crate) fn emit(&self, event: AuthChangeEvent, session: Option<&AuthSession>) {
        self.listeners.emit(event, session);
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn emit_signed_in(&self) {
        if let Some(session) = self.session_to_emit.lock().unwrap().clone() {
            self.listeners.emit(AuthChangeEvent::SignedIn, Some(&session));
        }
    }
}

impl Default for MockAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthClient for MockAuthClient {
    async fn password_sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_target: &str,
    ) -> Result<(), AuthClientError> {
        self.record(RecordedCall::PasswordSignUp {
            email: email.to_string(),
            password: password.to_string(),
            redirect_target: redirect_target.to_string(),
        });
        self.password_sign_up_result.lock().unwrap().clone()
    }

    async fn password_sign_in(&self, email: &str, password: &str) -> Result<(), AuthClientError> {
        self.record(RecordedCall::PasswordSignIn {
            email: email.to_string(),
            password: password.to_string(),
        });
        let result = self.password_sign_in_result.lock().unwrap().clone();
        if result.is_ok() {
            self.emit_signed_in();
        }
        result
    }

    async fn resend_confirmation(
        &self,
        email: &str,
        redirect_target: &str,
    ) -> Result<(), AuthClientError> {
        self.record(RecordedCall::ResendConfirmation {
            email: email.to_string(),
            redirect_target: redirect_target.to_string(),
        });
        self.resend_confirmation_result.lock().unwrap().clone()
    }

    async fn start_oauth(
        &self,
        provider: OAuthProvider,
        redirect_target: &str,
    ) -> Result<String, AuthClientError> {
        self.record(RecordedCall::StartOAuth {
            provider,
            redirect_target: redirect_target.to_string(),
        });
        self.start_oauth_result.lock().unwrap().clone()
    }

    async fn exchange_code(&self, code: &str) -> Result<(), AuthClientError> {
        self.record(RecordedCall::ExchangeCode {
            code: code.to_string(),
        });
        let result = self.exchange_code_result.lock().unwrap().clone();
        if result.is_ok() {
            self.emit_signed_in();
        }
        result
    }

    async fn set_session_from_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AuthClientError> {
        self.record(RecordedCall::SetSessionFromTokens {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        });
        let result = self.set_session_from_tokens_result.lock().unwrap().clone();
        if result.is_ok() {
            self.emit_signed_in();
        }
        result
    }

    async fn sign_in_with_id_token(
        &self,
        provider: OAuthProvider,
        id_token: &str,
    ) -> Result<(), AuthClientError> {
        self.record(RecordedCall::SignInWithIdToken {
            provider,
            id_token: id_token.to_string(),
        });
        let result = self.sign_in_with_id_token_result.lock().unwrap().clone();
        if result.is_ok() {
            self.emit_signed_in();
        }
        result
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, AuthClientError> {
        self.record(RecordedCall::CurrentSession);
        if let Some(session) = self.emit_during_current_session.lock().unwrap().take() {
            self.listeners.emit(AuthChangeEvent::SignedIn, Some(&session));
        }
        self.current_session_result.lock().unwrap().clone()
    }

    fn on_auth_state_change(&self, callback: AuthChangeCallback) -> AuthSubscription {
        self.listeners.subscribe(callback)
    }

    async fn sign_out(&self) {
        self.record(RecordedCall::SignOut);
        self.listeners.emit(AuthChangeEvent::SignedOut, None);
    }
}
