//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use reclaim_network::JsonRpcTransport;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;
use crate::AppState;

/// Build the API router over shared state.
pub fn router<T: JsonRpcTransport>(state: Arc<AppState<T>>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/accounts", get(handlers::accounts::<T>))
        .route("/api/token-metadata", get(handlers::token_metadata::<T>))
        .route("/api/blockhash", get(handlers::blockhash::<T>))
        .route(
            "/api/referrals",
            get(handlers::referrals::<T>).post(handlers::record_referral::<T>),
        )
        .route("/api/referrals/claim", post(handlers::claim_referrals::<T>))
        .route("/api/fee", get(handlers::fee_quote::<T>))
        .route("/api/burns", post(handlers::settle_burn::<T>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer<T> {
    pub addr: SocketAddr,
    pub state: Arc<AppState<T>>,
}

impl<T: JsonRpcTransport> RpcServer<T> {
    pub fn new(addr: SocketAddr, state: Arc<AppState<T>>) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until `shutdown` resolves. In-flight requests are
    /// drained before returning.
    pub async fn start<F>(&self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %listener.local_addr()?, "HTTP API listening");
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await
    }
}
