/// How a sign-in attempt ended when it did not error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The attempt went through. When it produced a session, the session
    /// store reflects it via the adapter's change notification.
    Completed,
    /// Account created; sign-in continues after the user confirms the
    /// address from their inbox. Carries the email the confirmation went to.
    CheckEmail { email: String },
    /// The user backed out of the browser or native prompt. Show nothing.
    Cancelled,
}
