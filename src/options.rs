//! Client configuration and secret handling.

use std::collections::HashMap;
use std::time::Duration;

use crate::streaming::UnknownEventPolicy;

/// Default API host, matching the Dify cloud deployment.
pub const DEFAULT_BASE_URL: &str = "https://api.dify.ai/v1";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Transport and decoding configuration shared by every client produced
/// from it.
///
/// # Example
/// ```rust
/// use dify_client::options::DifyOptions;
/// use std::time::Duration;
///
/// let options = DifyOptions::new()
///     .with_base_url("https://dify.internal.example.com/v1".to_string())
///     .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct DifyOptions {
    /// Base URL for API endpoints, joined with each operation's path.
    pub base_url: String,

    /// Request timeout. Streaming calls inherit it too, so leave it unset
    /// for long-running workflows.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL.
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in every request.
    pub extra_headers: Option<HashMap<String, String>>,

    /// What to do with a stream frame whose `event` discriminator is not
    /// recognized.
    pub unknown_event_policy: UnknownEventPolicy,
}

impl Default for DifyOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            proxy: None,
            extra_headers: None,
            unknown_event_policy: UnknownEventPolicy::default(),
        }
    }
}

impl DifyOptions {
    /// Create options pointing at the Dify cloud API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set extra headers.
    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Set the unknown-event policy for streaming calls.
    pub fn with_unknown_event_policy(mut self, policy: UnknownEventPolicy) -> Self {
        self.unknown_event_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_redacted() {
        let secret = SecretString::from("app-very-secret");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.expose_secret(), "app-very-secret");
    }

    #[test]
    fn options_builders_compose() {
        let options = DifyOptions::new()
            .with_base_url("http://localhost:5001/v1".to_string())
            .with_timeout(Duration::from_secs(10))
            .with_header("X-Request-Source".to_string(), "tests".to_string());

        assert_eq!(options.base_url, "http://localhost:5001/v1");
        assert_eq!(options.timeout, Some(Duration::from_secs(10)));
        assert_eq!(
            options.extra_headers.unwrap().get("X-Request-Source"),
            Some(&"tests".to_string())
        );
    }

    #[test]
    fn default_points_at_dify_cloud() {
        assert_eq!(DifyOptions::default().base_url, DEFAULT_BASE_URL);
    }
}
