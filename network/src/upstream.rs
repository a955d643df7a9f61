//! Upstream facade shared by the HTTP handlers.

use std::sync::Arc;

use crate::resolver::EndpointResolver;
use crate::transport::JsonRpcTransport;

/// A transport plus the resolvers for plain RPC and DAS endpoints.
///
/// Constructed once at start-up; the resolvers carry the process-wide
/// failure state, so every request must go through the same instance.
pub struct Upstream<T> {
    pub(crate) transport: T,
    pub(crate) rpc: Arc<EndpointResolver>,
    pub(crate) das: Arc<EndpointResolver>,
    pub(crate) max_attempts: u32,
}

impl<T: JsonRpcTransport> Upstream<T> {
    pub fn new(
        transport: T,
        rpc: Arc<EndpointResolver>,
        das: Arc<EndpointResolver>,
        max_attempts: u32,
    ) -> Self {
        Self {
            transport,
            rpc,
            das,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn rpc_resolver(&self) -> &EndpointResolver {
        &self.rpc
    }

    pub fn das_resolver(&self) -> &EndpointResolver {
        &self.das
    }
}
