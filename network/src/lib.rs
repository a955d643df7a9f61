//! Upstream access for the rent reclaim service.
//!
//! - [`EndpointResolver`] picks a live endpoint from a primary plus ordered
//!   fallbacks and keeps recently failed endpoints in cooldown.
//! - [`failover`] wraps an upstream operation in the bounded retry protocol.
//! - [`Upstream`] bundles a transport with the RPC and DAS resolvers and
//!   exposes the fetchers: token accounts, token metadata, latest blockhash.

pub mod accounts;
pub mod blockhash;
pub mod config;
pub mod error;
pub mod failover;
pub mod metadata;
pub mod resolver;
pub mod transport;
pub mod upstream;

pub use accounts::TokenAccount;
pub use blockhash::LatestBlockhash;
pub use config::{EndpointSet, FailoverConfig};
pub use error::{NetworkError, UpstreamError};
pub use failover::{AttemptBudget, RetryMode};
pub use metadata::TokenMetadata;
pub use resolver::{redact, Cooldowns, EndpointHealth, EndpointResolver};
pub use transport::{HttpTransport, JsonRpcTransport};
pub use upstream::Upstream;
