//! Account and timeout configuration.

use easync_ntlm::Credentials;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Per-operation timeouts.
///
/// Interactive commands use a moderate fixed timeout; Direct Push
/// requests derive their read timeout from the requested heartbeat
/// plus `ping_margin`; attachment downloads get their own, larger
/// budget.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Timeout for interactive commands.
    pub command: Duration,
    /// Safety margin added to the heartbeat for ping requests.
    pub ping_margin: Duration,
    /// Timeout for attachment downloads.
    pub attachment: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(30),
            ping_margin: Duration::from_secs(30),
            attachment: Duration::from_secs(180),
        }
    }
}

/// Configuration for one ActiveSync account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Server base URL, scheme + host + optional port
    /// (e.g. `https://mail.example.com`).
    pub server_url: String,
    /// Account credentials.
    pub credentials: Credentials,
    /// Suffix mixed into the device id derivation, to disambiguate
    /// multiple accounts with the same user name.
    pub device_id_suffix: String,
    /// The `DeviceType` query parameter value.
    pub device_type: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Operation timeouts.
    pub timeouts: Timeouts,
}

impl AccountConfig {
    /// Creates an account configuration.
    pub fn new(server_url: impl Into<String>, credentials: Credentials) -> Self {
        let mut server_url = server_url.into();
        while server_url.ends_with('/') {
            server_url.pop();
        }
        Self {
            server_url,
            credentials,
            device_id_suffix: String::new(),
            device_type: "Android".to_string(),
            user_agent: "easync/0.3".to_string(),
            timeouts: Timeouts::default(),
        }
    }

    /// Sets the device id suffix.
    pub fn with_device_id_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.device_id_suffix = suffix.into();
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the timeouts.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The stable device identifier for this account.
    ///
    /// Derived deterministically from the user name and suffix so it
    /// never changes across restarts; a changed device id would force
    /// the server to demand fresh provisioning.
    pub fn device_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.credentials.username.as_bytes());
        hasher.update(b":");
        hasher.update(self.device_id_suffix.as_bytes());
        let digest = hasher.finalize();
        digest[..14]
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<String>()
    }

    /// The `domain\user` (or bare user) string for Basic auth.
    pub fn auth_user(&self) -> String {
        if self.credentials.domain.is_empty() {
            self.credentials.username.clone()
        } else {
            format!("{}\\{}", self.credentials.domain, self.credentials.username)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AccountConfig {
        AccountConfig::new(
            "https://mail.example.com/",
            Credentials::new("kim", "secret", "CORP"),
        )
    }

    #[test]
    fn trailing_slash_normalized() {
        assert_eq!(config().server_url, "https://mail.example.com");
    }

    #[test]
    fn device_id_is_stable_and_bounded() {
        let a = config().device_id();
        let b = config().device_id();
        assert_eq!(a, b);
        assert_eq!(a.len(), 28);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn device_id_depends_on_user_and_suffix() {
        let base = config();
        let other_user = AccountConfig::new(
            "https://mail.example.com",
            Credentials::new("sam", "secret", "CORP"),
        );
        let other_suffix = config().with_device_id_suffix("2");
        assert_ne!(base.device_id(), other_user.device_id());
        assert_ne!(base.device_id(), other_suffix.device_id());
    }

    #[test]
    fn auth_user_formats() {
        assert_eq!(config().auth_user(), "CORP\\kim");
        let no_domain = AccountConfig::new(
            "https://mail.example.com",
            Credentials::new("kim@example.com", "secret", ""),
        );
        assert_eq!(no_domain.auth_user(), "kim@example.com");
    }
}
