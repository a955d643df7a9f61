//! Endpoint and failover configuration.

use serde::{Deserialize, Serialize};

/// A primary endpoint plus ordered public fallbacks.
///
/// Empty strings are treated as unset, so an environment variable that
/// expands to nothing does not create a bogus candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSet {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl EndpointSet {
    pub fn new(primary: Option<&str>, fallbacks: &[&str]) -> Self {
        Self {
            primary: primary.map(str::to_string),
            fallbacks: fallbacks.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Cooldown and retry settings shared by every resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// How long a failed fallback is skipped by rotation.
    #[serde(default = "default_short_cooldown_secs")]
    pub short_cooldown_secs: u64,

    /// How long a failed primary is avoided before it is preferred again.
    #[serde(default = "default_primary_cooldown_secs")]
    pub primary_cooldown_secs: u64,

    /// Total attempts per upstream operation.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-request timeout applied by the HTTP transport.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_short_cooldown_secs() -> u64 {
    5 * 60
}

fn default_primary_cooldown_secs() -> u64 {
    10 * 60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            short_cooldown_secs: default_short_cooldown_secs(),
            primary_cooldown_secs: default_primary_cooldown_secs(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
