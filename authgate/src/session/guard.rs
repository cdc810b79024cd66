use super::types::SessionState;

/// Navigation stacks the app can present. `Auth` holds the sign-in and
/// sign-up screens, `App` everything behind authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenStack {
    Auth,
    App,
}

/// Stack to present for `state`. `Unknown` maps to `Auth`: until the
/// startup session is resolved, the auth screens are the safe default.
pub fn active_stack(state: &SessionState) -> ScreenStack {
    match state {
        SessionState::Authenticated(_) => ScreenStack::App,
        SessionState::Unknown | SessionState::Unauthenticated => ScreenStack::Auth,
    }
}

/// Whether `stack` may be shown under `state`. Exactly one stack is
/// reachable at a time.
pub fn is_reachable(stack: ScreenStack, state: &SessionState) -> bool {
    active_stack(state) == stack
}
