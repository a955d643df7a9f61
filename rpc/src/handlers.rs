//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use reclaim_ledger::{FeeLedger, FeeQuote, LedgerError};
use reclaim_network::metadata::parse_mint_list;
use reclaim_network::{JsonRpcTransport, LatestBlockhash, TokenAccount, TokenMetadata};
use reclaim_store::{ReferralEarning, ReferralStat};
use reclaim_types::{Lamports, TxSignature, WalletAddress};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::{ApiError, AppState};

type SharedState<T> = State<Arc<AppState<T>>>;

fn require_wallet(raw: Option<&str>, field: &str) -> Result<WalletAddress, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(WalletAddress::parse(raw)?),
        None => Err(ApiError::InvalidInput(format!("missing {field} parameter"))),
    }
}

fn json_body<B>(body: Result<Json<B>, JsonRejection>) -> Result<B, ApiError> {
    body.map(|Json(b)| b)
        .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))
}

/// Run a blocking ledger call off the async runtime.
async fn with_ledger<R, F>(ledger: &Arc<FeeLedger>, f: F) -> Result<R, ApiError>
where
    F: FnOnce(&FeeLedger) -> Result<R, LedgerError> + Send + 'static,
    R: Send + 'static,
{
    let ledger = ledger.clone();
    tokio::task::spawn_blocking(move || f(&ledger))
        .await
        .map_err(|e| ApiError::Internal(format!("ledger task failed: {e}")))?
        .map_err(ApiError::from)
}

// ── Health ───────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ── Accounts ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WalletQuery {
    pub wallet: Option<String>,
}

#[derive(Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<TokenAccount>,
}

pub async fn accounts<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let owner = require_wallet(query.wallet.as_deref(), "wallet")?;
    let accounts = state.upstream.closable_token_accounts(&owner).await?;
    Ok(Json(AccountsResponse { accounts }))
}

// ── Metadata ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MintsQuery {
    pub mints: Option<String>,
}

pub async fn token_metadata<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    Query(query): Query<MintsQuery>,
) -> Json<Vec<TokenMetadata>> {
    let mints = parse_mint_list(query.mints.as_deref().unwrap_or_default());
    if mints.is_empty() {
        return Json(Vec::new());
    }
    Json(state.upstream.token_metadata(&mints).await)
}

// ── Blockhash ────────────────────────────────────────────────────────────

pub async fn blockhash<T: JsonRpcTransport>(
    State(state): SharedState<T>,
) -> Result<Json<LatestBlockhash>, ApiError> {
    Ok(Json(state.upstream.latest_blockhash().await?))
}

// ── Fees ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct FeeQuery {
    pub payer: Option<String>,
    pub referrer: Option<String>,
}

fn optional_wallet(raw: Option<&str>) -> Result<Option<WalletAddress>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(WalletAddress::parse(raw)?)),
        None => Ok(None),
    }
}

pub async fn fee_quote<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    Query(query): Query<FeeQuery>,
) -> Result<Json<FeeQuote>, ApiError> {
    let payer = optional_wallet(query.payer.as_deref())?;
    let referrer = optional_wallet(query.referrer.as_deref())?;
    Ok(Json(state.ledger.quote(payer.as_ref(), referrer.as_ref())))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleBurnRequest {
    pub payer_wallet: String,
    #[serde(default)]
    pub referrer_wallet: Option<String>,
    pub burn_tx: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleBurnResponse {
    pub total_fee: Lamports,
    pub protocol_share: Lamports,
    pub referrer_share: Lamports,
    pub attribution: &'static str,
}

/// Settle the service fee of a submitted burn transaction. Succeeds even
/// when the referral cannot be recorded; `attribution` says what happened.
pub async fn settle_burn<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    body: Result<Json<SettleBurnRequest>, JsonRejection>,
) -> Result<Json<SettleBurnResponse>, ApiError> {
    let req = json_body(body)?;
    let payer = WalletAddress::parse(&req.payer_wallet)?;
    let burn_tx = TxSignature::parse(&req.burn_tx)?;
    // A malformed referral code only costs the attribution.
    let referrer = req
        .referrer_wallet
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .and_then(|raw| match WalletAddress::parse(raw) {
            Ok(w) => Some(w),
            Err(e) => {
                debug!(referrer = raw, error = %e, "ignoring malformed referrer");
                None
            }
        });

    let settlement = with_ledger(&state.ledger, move |ledger| {
        Ok(ledger.settle_burn(&payer, referrer.as_ref(), &burn_tx))
    })
    .await?;

    Ok(Json(SettleBurnResponse {
        total_fee: settlement.total_fee,
        protocol_share: settlement.split.protocol_share,
        referrer_share: settlement.split.referrer_share,
        attribution: settlement.attribution.as_str(),
    }))
}

// ── Referrals ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEarningRequest {
    pub referrer_wallet: String,
    pub amount: Lamports,
    pub burn_tx: String,
}

pub async fn record_referral<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    body: Result<Json<RecordEarningRequest>, JsonRejection>,
) -> Result<Json<ReferralEarning>, ApiError> {
    let req = json_body(body)?;
    let referrer = WalletAddress::parse(&req.referrer_wallet)?;
    let burn_tx = TxSignature::parse(&req.burn_tx)?;
    let amount = req.amount;

    let record = with_ledger(&state.ledger, move |ledger| {
        ledger.record_earning(&referrer, amount, &burn_tx)
    })
    .await?;
    Ok(Json(record))
}

#[derive(Serialize)]
pub struct ReferralsResponse {
    pub earnings: Vec<ReferralEarning>,
    pub stats: Option<ReferralStat>,
}

pub async fn referrals<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<ReferralsResponse>, ApiError> {
    let wallet = require_wallet(query.wallet.as_deref(), "wallet")?;
    let response = with_ledger(&state.ledger, move |ledger| {
        Ok(ReferralsResponse {
            earnings: ledger.earnings(&wallet)?,
            stats: ledger.stats(&wallet)?,
        })
    })
    .await?;
    Ok(Json(response))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub referrer_wallet: String,
    pub claim_tx: String,
}

#[derive(Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub claimed: Lamports,
}

pub async fn claim_referrals<T: JsonRpcTransport>(
    State(state): SharedState<T>,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let req = json_body(body)?;
    let referrer = WalletAddress::parse(&req.referrer_wallet)?;
    let claim_tx = TxSignature::parse(&req.claim_tx)?;

    let claimed = with_ledger(&state.ledger, move |ledger| {
        ledger.claim_earnings(&referrer, &claim_tx)
    })
    .await?;
    Ok(Json(ClaimResponse {
        success: true,
        claimed,
    }))
}
