//! Configuration types for the Parapet engine.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::Result;

/// Configuration for the engine facade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParapetConfig {
    /// Payload signature scoring settings.
    pub detection: DetectionConfig,

    /// Request-rate window settings.
    pub rate: RateLimitConfig,

    /// Sensitive-endpoint lockout settings.
    pub brute: BruteForceConfig,

    /// Trust, whitelist, and ban settings.
    pub access: AccessConfig,
}

impl ParapetConfig {
    /// Checks settings that the component constructors cannot.
    ///
    /// # Errors
    ///
    /// Returns an error when the alert threshold is zero; a zero threshold
    /// would silence the suspicious-payload warning entirely.
    pub fn validate(&self) -> Result<()> {
        if self.detection.alert_threshold == 0 {
            return Err(CoreError::InvalidConfig(
                "detection.alert_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload signature scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Severity at or above which a payload stops being merely
    /// "suspicious". Matches below this score are logged as warnings;
    /// blocking itself is governed by category presence, not score.
    pub alert_threshold: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { alert_threshold: 5 }
    }
}

/// Request-rate window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// Requests allowed inside the window; one more trips the limit.
    pub threshold: usize,

    /// Path suffixes exempt from rate limiting. Pages pull many of these
    /// per load, so counting them would punish normal browsing.
    pub static_extensions: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 10,
            threshold: 50,
            static_extensions: [
                ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".ico", ".svg",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

/// Sensitive-endpoint lockout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BruteForceConfig {
    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// Attempts allowed inside the window; one more trips the lockout.
    pub threshold: usize,

    /// Substrings that mark a URL as a credential endpoint. Matched
    /// case-insensitively against the full URL.
    pub sensitive_markers: Vec<String>,
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            window_secs: 30,
            threshold: 5,
            sensitive_markers: ["login", "signin", "auth", "userinfo.php"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Trust, whitelist, and ban settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// How long a tripped limit bans the source, in seconds.
    pub ban_secs: u64,

    /// Source addresses exempt from every check and from banning.
    pub trusted: Vec<String>,

    /// Destination hosts allowed without inspection, matched exactly or as
    /// a parent domain of the request host.
    pub whitelist: Vec<String>,

    /// host:port values identifying the firewall's own operator surface;
    /// requests mentioning one bypass inspection without an audit entry.
    pub dashboard_hosts: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            ban_secs: 120,
            trusted: vec!["127.0.0.1".to_string(), "::1".to_string()],
            whitelist: [
                "unpkg.com",
                "cdn.tailwindcss.com",
                "cdnjs.cloudflare.com",
                "fonts.googleapis.com",
                "fonts.gstatic.com",
                "127.0.0.1",
                "localhost",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            dashboard_hosts: vec!["127.0.0.1:5000".to_string(), "localhost:5000".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParapetConfig::default();
        assert_eq!(config.detection.alert_threshold, 5);
        assert_eq!(config.rate.window_secs, 10);
        assert_eq!(config.rate.threshold, 50);
        assert_eq!(config.brute.window_secs, 30);
        assert_eq!(config.brute.threshold, 5);
        assert_eq!(config.access.ban_secs, 120);
        assert_eq!(config.rate.static_extensions.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_alert_threshold_rejected() {
        let mut config = ParapetConfig::default();
        config.detection.alert_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = ParapetConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ParapetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.rate.threshold, config.rate.threshold);
        assert_eq!(parsed.access.whitelist, config.access.whitelist);
    }
}
