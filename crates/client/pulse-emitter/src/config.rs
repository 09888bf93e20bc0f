//! Emitter configuration

use std::time::Duration;

/// Where and how events are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Base URL of the Pulse server, without a trailing slash
    pub endpoint: String,
    /// Bearer token expected by the server
    pub api_key: String,
    /// Master switch; when false every call is a no-op
    pub enabled: bool,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Version of the instrumented application
    pub app_version: Option<String>,
    /// Operating system reported with each event
    pub os: String,
}

/// Default per-request timeout (10 seconds)
const REQUEST_TIMEOUT_MS: u64 = 10_000;

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3001".to_string(),
            api_key: String::new(),
            enabled: true,
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            app_version: None,
            os: std::env::consts::OS.to_string(),
        }
    }
}

impl EmitterConfig {
    /// Config for a server at `endpoint` using `api_key`
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.into()),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `PULSE_ENDPOINT`, `PULSE_API_KEY` and `PULSE_ANALYTICS_ENABLED`
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; blank values are ignored
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = var("PULSE_ENDPOINT") {
            self.endpoint = trim_endpoint(endpoint);
        }
        if let Some(api_key) = var("PULSE_API_KEY") {
            self.api_key = api_key;
        }
        if let Some(flag) = var("PULSE_ANALYTICS_ENABLED") {
            // Anything but an explicit "off" keeps analytics on
            self.enabled = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        self
    }

    /// Set the reported application version
    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable sending
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }
}

fn trim_endpoint(endpoint: String) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = EmitterConfig::default().with_env(env(&[
            ("PULSE_ENDPOINT", "https://pulse.example.com/"),
            ("PULSE_API_KEY", "k3y"),
        ]));

        assert_eq!(config.endpoint, "https://pulse.example.com");
        assert_eq!(config.api_key, "k3y");
        assert!(config.enabled);
        assert_eq!(
            config.url("/api/analytics/error"),
            "https://pulse.example.com/api/analytics/error"
        );
    }

    #[test]
    fn test_enabled_flag() {
        for off in ["false", "0", "OFF", "no"] {
            let config =
                EmitterConfig::default().with_env(env(&[("PULSE_ANALYTICS_ENABLED", off)]));
            assert!(!config.enabled, "{off}");
        }
        let config = EmitterConfig::default().with_env(env(&[("PULSE_ANALYTICS_ENABLED", "  ")]));
        assert!(config.enabled);
    }
}
