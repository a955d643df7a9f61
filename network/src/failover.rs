//! Bounded retry across endpoints.
//!
//! Every attempt resolves a fresh endpoint. Errors are classified:
//!
//! - access denied / rate limited: the endpoint is reported failed and the
//!   operation is retried on whatever the resolver picks next;
//! - anything else on the final attempt: returned as a hard failure;
//! - anything else earlier: [`RetryMode::FailFast`] returns it at once,
//!   [`RetryMode::Persistent`] tries again.
//!
//! Running out of attempts yields [`NetworkError::Exhausted`].

use std::future::Future;

use tracing::{debug, warn};

use crate::resolver::{redact, EndpointResolver};
use crate::{NetworkError, UpstreamError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryMode {
    /// Only access-denied errors are retried.
    FailFast,
    /// Every error except one on the final attempt is retried.
    Persistent,
}

/// Attempts shared by every upstream call made on behalf of one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptBudget {
    limit: u32,
    used: u32,
}

impl AttemptBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            used: 0,
        }
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> u32 {
        self.limit - self.used
    }
}

/// Run `op` against resolved endpoints, at most `max_attempts` times.
pub async fn with_failover<T, F, Fut>(
    resolver: &EndpointResolver,
    max_attempts: u32,
    mode: RetryMode,
    op: F,
) -> Result<T, NetworkError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut budget = AttemptBudget::new(max_attempts);
    with_failover_budget(resolver, &mut budget, mode, op).await
}

/// Like [`with_failover`], drawing attempts from `budget` so that several
/// calls serving the same request share one ceiling.
pub async fn with_failover_budget<T, F, Fut>(
    resolver: &EndpointResolver,
    budget: &mut AttemptBudget,
    mode: RetryMode,
    mut op: F,
) -> Result<T, NetworkError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut last_error = String::from("attempt budget already spent");

    while budget.remaining() > 0 {
        budget.used += 1;
        let attempt = budget.used;
        let final_attempt = budget.remaining() == 0;
        let endpoint = resolver.select_endpoint();
        debug!(resolver = resolver.label(), attempt, endpoint = %redact(&endpoint), "upstream attempt");

        match op(endpoint.clone()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_access_denied() => {
                warn!(
                    resolver = resolver.label(),
                    attempt,
                    endpoint = %redact(&endpoint),
                    error = %e,
                    "access denied, rotating endpoint"
                );
                resolver.report_failure(&endpoint);
                last_error = e.to_string();
            }
            Err(e) if final_attempt || mode == RetryMode::FailFast => {
                return Err(NetworkError::Upstream(e));
            }
            Err(e) => {
                debug!(resolver = resolver.label(), attempt, error = %e, "retrying after upstream error");
                last_error = e.to_string();
            }
        }
    }

    Err(NetworkError::Exhausted {
        attempts: budget.used(),
        last_error,
    })
}
