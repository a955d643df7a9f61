//! Endpoint selection with failure cooldowns.
//!
//! Each resolver owns a fixed candidate list: an optional primary endpoint
//! and ordered fallbacks. Per-endpoint state is a single optional
//! last-failure timestamp:
//!
//! ```text
//! Healthy --report_failure--> Cooling --cooldown elapses--> Healthy
//! ```
//!
//! The primary is preferred whenever it has not failed within the long
//! (primary) cooldown. Otherwise fallbacks are rotated round-robin, skipping
//! any that failed within the short cooldown. If every fallback is cooling
//! the rotation still advances by one so requests degrade instead of fail.
//!
//! State lives only in memory and resets on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reclaim_types::{Clock, Timestamp};
use tracing::{debug, warn};

use crate::config::{EndpointSet, FailoverConfig};
use crate::NetworkError;

/// Graduated cooldown windows, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cooldowns {
    pub short_secs: u64,
    pub primary_secs: u64,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self::from(&FailoverConfig::default())
    }
}

impl From<&FailoverConfig> for Cooldowns {
    fn from(cfg: &FailoverConfig) -> Self {
        Self {
            short_secs: cfg.short_cooldown_secs,
            primary_secs: cfg.primary_cooldown_secs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointHealth {
    Healthy,
    Cooling { remaining_secs: u64 },
}

#[derive(Default)]
struct ResolverState {
    last_failure: HashMap<String, Timestamp>,
    /// Index of the next fallback to try.
    cursor: usize,
}

impl ResolverState {
    fn is_cooling(&self, endpoint: &str, window_secs: u64, now: Timestamp) -> bool {
        self.last_failure
            .get(endpoint)
            .is_some_and(|failed_at| failed_at.elapsed_since(now) < window_secs)
    }
}

pub struct EndpointResolver {
    label: String,
    primary: Option<String>,
    fallbacks: Vec<String>,
    cooldowns: Cooldowns,
    clock: Arc<dyn Clock>,
    state: Mutex<ResolverState>,
}

impl EndpointResolver {
    /// Build a resolver over `set`.
    ///
    /// Blank entries are dropped, as are fallbacks that repeat the primary
    /// or an earlier fallback. Fails with
    /// [`NetworkError::NoEndpointsConfigured`] if nothing is left.
    pub fn new(
        label: impl Into<String>,
        set: &EndpointSet,
        cooldowns: Cooldowns,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NetworkError> {
        let label = label.into();
        let primary = set
            .primary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut fallbacks: Vec<String> = Vec::with_capacity(set.fallbacks.len());
        for candidate in set.fallbacks.iter().map(|s| s.trim()) {
            if candidate.is_empty()
                || primary.as_deref() == Some(candidate)
                || fallbacks.iter().any(|f| f == candidate)
            {
                continue;
            }
            fallbacks.push(candidate.to_string());
        }

        if primary.is_none() && fallbacks.is_empty() {
            return Err(NetworkError::NoEndpointsConfigured(label));
        }

        debug!(
            resolver = %label,
            primary = %primary.as_deref().map(redact).unwrap_or_default(),
            fallbacks = fallbacks.len(),
            "endpoint resolver ready"
        );

        Ok(Self {
            label,
            primary,
            fallbacks,
            cooldowns,
            clock,
            state: Mutex::new(ResolverState::default()),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    fn is_candidate(&self, endpoint: &str) -> bool {
        self.primary.as_deref() == Some(endpoint) || self.fallbacks.iter().any(|f| f == endpoint)
    }

    // The state is a map of timestamps plus a cursor; a panic mid-update
    // cannot leave it inconsistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the endpoint for the next request.
    pub fn select_endpoint(&self) -> String {
        let now = self.clock.now();
        let mut state = self.lock();

        if let Some(primary) = &self.primary {
            if self.fallbacks.is_empty()
                || !state.is_cooling(primary, self.cooldowns.primary_secs, now)
            {
                return primary.clone();
            }
        }

        let n = self.fallbacks.len();
        for offset in 0..n {
            let idx = (state.cursor + offset) % n;
            let candidate = &self.fallbacks[idx];
            if !state.is_cooling(candidate, self.cooldowns.short_secs, now) {
                state.cursor = (idx + 1) % n;
                return candidate.clone();
            }
        }

        let idx = state.cursor % n;
        state.cursor = (idx + 1) % n;
        debug!(resolver = %self.label, "every fallback is cooling down, rotating anyway");
        self.fallbacks[idx].clone()
    }

    /// Mark `endpoint` as failed now. Repeated reports just move the
    /// timestamp; blank or unknown endpoints are ignored.
    pub fn report_failure(&self, endpoint: &str) {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return;
        }
        if !self.is_candidate(endpoint) {
            debug!(resolver = %self.label, endpoint = %redact(endpoint), "ignoring failure for unknown endpoint");
            return;
        }
        let now = self.clock.now();
        self.lock().last_failure.insert(endpoint.to_string(), now);
        warn!(resolver = %self.label, endpoint = %redact(endpoint), "endpoint failed, cooling down");
    }

    pub fn health(&self, endpoint: &str) -> EndpointHealth {
        let window = if self.primary.as_deref() == Some(endpoint) {
            self.cooldowns.primary_secs
        } else {
            self.cooldowns.short_secs
        };
        let now = self.clock.now();
        match self.lock().last_failure.get(endpoint) {
            Some(failed_at) if failed_at.elapsed_since(now) < window => EndpointHealth::Cooling {
                remaining_secs: window - failed_at.elapsed_since(now),
            },
            _ => EndpointHealth::Healthy,
        }
    }
}

/// Strip the query string from an endpoint URL for logging. Provider API
/// keys are passed as query parameters.
pub fn redact(endpoint: &str) -> String {
    match endpoint.split_once('?') {
        Some((base, _)) => format!("{base}?<redacted>"),
        None => endpoint.to_string(),
    }
}
