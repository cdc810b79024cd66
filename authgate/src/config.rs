use std::env;

/// Environment variable names, in the order missing-configuration errors
/// report them.
pub const ENV_BACKEND_URL: &str = "AUTHGATE_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "AUTHGATE_ANON_KEY";
pub const ENV_GOOGLE_WEB_CLIENT_ID: &str = "AUTHGATE_GOOGLE_WEB_CLIENT_ID";
pub const ENV_GOOGLE_IOS_CLIENT_ID: &str = "AUTHGATE_GOOGLE_IOS_CLIENT_ID";
pub const ENV_GOOGLE_ANDROID_CLIENT_ID: &str = "AUTHGATE_GOOGLE_ANDROID_CLIENT_ID";

const ENV_REDIRECT_SCHEME: &str = "AUTHGATE_REDIRECT_SCHEME";
const ENV_REDIRECT_PATH: &str = "AUTHGATE_REDIRECT_PATH";
const ENV_WEB_ORIGIN: &str = "AUTHGATE_WEB_ORIGIN";
const ENV_STORAGE_KEY: &str = "AUTHGATE_STORAGE_KEY";

const DEFAULT_REDIRECT_SCHEME: &str = "authgate";
const DEFAULT_REDIRECT_PATH: &str = "sign-in";
const DEFAULT_WEB_ORIGIN: &str = "http://localhost:8081";
const DEFAULT_STORAGE_KEY: &str = "authgate-session";

/// Runtime target the app was built for. Selects the redirect target form
/// and which native Google client IDs are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Web,
}

/// Sign-in method a flow is about to attempt. Each method has its own set of
/// required configuration names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMethod {
    Password,
    OAuthRedirect,
    NativeGoogle,
    NativeApple,
}

/// Where the backend or browser should send the user after an email link or
/// OAuth round trip. Native targets use a custom URL scheme, browser targets
/// return to the page origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    Scheme { scheme: String, path: String },
    Origin { origin: String, path: String },
}

impl RedirectTarget {
    pub fn as_url(&self) -> String {
        match self {
            Self::Scheme { scheme, path } => format!("{scheme}://{path}"),
            Self::Origin { origin, path } => {
                format!("{}/{path}", origin.trim_end_matches('/'))
            }
        }
    }
}

/// Environment-provided configuration. Presence, not content, is what the
/// flows check before calling out; values stay opaque to this crate.
///
/// Read it freshly wherever staleness matters: [`Config::from_env`] is a
/// plain constructor and nothing here is cached process-wide.
#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub google_web_client_id: Option<String>,
    pub google_ios_client_id: Option<String>,
    pub google_android_client_id: Option<String>,
    pub redirect_scheme: String,
    pub redirect_path: String,
    pub web_origin: Option<String>,
    pub storage_key: String,
}

impl Config {
    /// Read the `AUTHGATE_*` variables for the given platform. Empty or
    /// whitespace-only values count as absent.
    pub fn from_env(platform: Platform) -> Self {
        Self {
            platform,
            backend_url: read_env(ENV_BACKEND_URL),
            anon_key: read_env(ENV_ANON_KEY),
            google_web_client_id: read_env(ENV_GOOGLE_WEB_CLIENT_ID),
            google_ios_client_id: read_env(ENV_GOOGLE_IOS_CLIENT_ID),
            google_android_client_id: read_env(ENV_GOOGLE_ANDROID_CLIENT_ID),
            redirect_scheme: read_env(ENV_REDIRECT_SCHEME)
                .unwrap_or_else(|| DEFAULT_REDIRECT_SCHEME.to_string()),
            redirect_path: read_env(ENV_REDIRECT_PATH)
                .unwrap_or_else(|| DEFAULT_REDIRECT_PATH.to_string()),
            web_origin: read_env(ENV_WEB_ORIGIN),
            storage_key: read_env(ENV_STORAGE_KEY)
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
        }
    }

    /// Empty config for the given platform, nothing present. Test scaffolding
    /// and explicit builder-style setup start here.
    pub fn empty(platform: Platform) -> Self {
        Self {
            platform,
            backend_url: None,
            anon_key: None,
            google_web_client_id: None,
            google_ios_client_id: None,
            google_android_client_id: None,
            redirect_scheme: DEFAULT_REDIRECT_SCHEME.to_string(),
            redirect_path: DEFAULT_REDIRECT_PATH.to_string(),
            web_origin: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Names of required values that are currently absent, in declared
    /// order. Empty means the method may proceed.
    pub fn missing_required(&self, method: SignInMethod) -> Vec<&'static str> {
        let mut required: Vec<(&'static str, bool)> = vec![
            (ENV_BACKEND_URL, self.backend_url.is_some()),
            (ENV_ANON_KEY, self.anon_key.is_some()),
        ];

        if method == SignInMethod::NativeGoogle {
            required.push((
                ENV_GOOGLE_WEB_CLIENT_ID,
                self.google_web_client_id.is_some(),
            ));
            match self.platform {
                Platform::Ios => required.push((
                    ENV_GOOGLE_IOS_CLIENT_ID,
                    self.google_ios_client_id.is_some(),
                )),
                Platform::Android => required.push((
                    ENV_GOOGLE_ANDROID_CLIENT_ID,
                    self.google_android_client_id.is_some(),
                )),
                Platform::Web => {}
            }
        }

        required
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name)
            .collect()
    }

    /// Callback destination for this platform: `scheme://path` on device
    /// targets, `origin/path` on the browser target.
    pub fn redirect_target(&self) -> RedirectTarget {
        match self.platform {
            Platform::Ios | Platform::Android => RedirectTarget::Scheme {
                scheme: self.redirect_scheme.clone(),
                path: self.redirect_path.clone(),
            },
            Platform::Web => RedirectTarget::Origin {
                origin: self
                    .web_origin
                    .clone()
                    .unwrap_or_else(|| DEFAULT_WEB_ORIGIN.to_string()),
                path: self.redirect_path.clone(),
            },
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
