use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

use authgate::{BrowserOutcome, ExternalBrowser};

/// Console stand-in for the platform auth session: prints the authorization
/// URL for the user to open themselves, then accepts the pasted redirect
/// URL. An empty line cancels.
pub(crate) struct PromptBrowser;

#[async_trait]
impl ExternalBrowser for PromptBrowser {
    async fn authenticate(&self, auth_url: &str, redirect_target: &str) -> BrowserOutcome {
        println!("Open this URL in your browser:");
        println!("  {auth_url}");
        println!("Paste the {redirect_target} redirect URL here (empty line cancels):");

        let mut lines = BufReader::new(stdin()).lines();
        match lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => {
                BrowserOutcome::Success(line.trim().to_string())
            }
            Ok(_) => BrowserOutcome::Cancel,
            Err(_) => BrowserOutcome::Dismiss,
        }
    }
}
