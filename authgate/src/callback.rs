use thiserror::Error;
use url::Url;

/// Credential material recovered from a redirect or deep-link callback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackCredentials {
    /// Authorization code to exchange for a session.
    Code(String),
    /// Token pair delivered directly (implicit flow).
    Tokens {
        access_token: String,
        refresh_token: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// Error code the provider appended to the redirect, reported verbatim.
    #[error("{0}")]
    Provider(String),

    #[error("No auth code or tokens were returned from OAuth callback.")]
    NoCredentials,

    #[error("Invalid callback URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a callback URL into exactly one outcome, by strict priority:
/// provider error code, then authorization code, then token pair, else no
/// credential material.
///
/// Parameters are read from the query string first, then the fragment
/// (providers deliver implicit-flow tokens there). The first non-empty
/// occurrence of a name wins. Safe to call twice with the same URL; the
/// backend call a `Code` outcome triggers rejects a used code on its own.
pub fn parse_callback_url(url: &str) -> Result<CallbackCredentials, CallbackError> {
    let parsed = Url::parse(url).map_err(|e| CallbackError::InvalidUrl(e.to_string()))?;

    let mut params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    if let Some(fragment) = parsed.fragment() {
        params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }

    let find = |name: &str| {
        params
            .iter()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
    };

    if let Some(error_code) = find("error_code") {
        return Err(CallbackError::Provider(error_code));
    }
    if let Some(code) = find("code") {
        return Ok(CallbackCredentials::Code(code));
    }
    match (find("access_token"), find("refresh_token")) {
        (Some(access_token), Some(refresh_token)) => Ok(CallbackCredentials::Tokens {
            access_token,
            refresh_token,
        }),
        _ => Err(CallbackError::NoCredentials),
    }
}
