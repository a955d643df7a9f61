//! Shared handler state.

use std::sync::Arc;

use reclaim_ledger::FeeLedger;
use reclaim_network::Upstream;

pub struct AppState<T> {
    pub upstream: Upstream<T>,
    pub ledger: Arc<FeeLedger>,
}

impl<T> AppState<T> {
    pub fn new(upstream: Upstream<T>, ledger: Arc<FeeLedger>) -> Self {
        Self { upstream, ledger }
    }
}
