use async_trait::async_trait;

/// Terminal result of an external-browser authentication round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowserOutcome {
    /// The provider redirected back into the app with this URL.
    Success(String),
    /// The user cancelled from the browser chrome.
    Cancel,
    /// The browser went away without a redirect (switched apps, system
    /// dismissed the sheet).
    Dismiss,
}

/// Opens an authorization URL in a user-visible browser and waits for the
/// round trip to end. Implementations are platform glue: an in-app auth
/// session on device targets, a plain window or pasted redirect elsewhere.
#[async_trait]
pub trait ExternalBrowser: Send + Sync + 'static {
    async fn authenticate(&self, auth_url: &str, redirect_target: &str) -> BrowserOutcome;
}
