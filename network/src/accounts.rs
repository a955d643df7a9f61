//! Token account discovery.
//!
//! Lists the owner's accounts under both the SPL Token and Token-2022
//! programs and keeps the ones that can be closed: zero token balance and
//! not frozen. Their `lamports` are the rent deposit a close reclaims.

use reclaim_types::{Lamports, WalletAddress};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::failover::{with_failover_budget, AttemptBudget, RetryMode};
use crate::transport::JsonRpcTransport;
use crate::{NetworkError, Upstream, UpstreamError};

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccount {
    pub pubkey: String,
    pub mint: String,
    pub program_id: String,
    /// Raw token amount as reported by the node.
    pub amount: String,
    pub decimals: u8,
    /// Rent deposit held by the account.
    pub lamports: Lamports,
    pub is_empty: bool,
}

// ── jsonParsed response shapes ───────────────────────────────────────────

#[derive(Deserialize)]
struct KeyedAccountsResult {
    value: Vec<KeyedAccount>,
}

#[derive(Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountData,
}

#[derive(Deserialize)]
struct AccountData {
    lamports: Lamports,
    data: ParsedData,
}

#[derive(Deserialize)]
struct ParsedData {
    parsed: ParsedAccount,
}

#[derive(Deserialize)]
struct ParsedAccount {
    info: TokenAccountInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    #[serde(default)]
    state: Option<String>,
    token_amount: TokenAmount,
}

#[derive(Deserialize)]
struct TokenAmount {
    amount: String,
    decimals: u8,
}

fn parse_accounts(program_id: &str, result: Value) -> Result<Vec<TokenAccount>, UpstreamError> {
    let parsed: KeyedAccountsResult = serde_json::from_value(result)
        .map_err(|e| UpstreamError::InvalidResponse(format!("getTokenAccountsByOwner: {e}")))?;

    Ok(parsed
        .value
        .into_iter()
        .filter_map(|keyed| {
            let info = keyed.account.data.parsed.info;
            let is_empty = info.token_amount.amount.trim_start_matches('0').is_empty();
            // frozen accounts reject CloseAccount
            if !is_empty || info.state.as_deref() == Some("frozen") {
                return None;
            }
            Some(TokenAccount {
                pubkey: keyed.pubkey,
                mint: info.mint,
                program_id: program_id.to_string(),
                amount: info.token_amount.amount,
                decimals: info.token_amount.decimals,
                lamports: keyed.account.lamports,
                is_empty,
            })
        })
        .collect())
}

impl<T: JsonRpcTransport> Upstream<T> {
    /// Closable token accounts owned by `owner`, sorted by pubkey.
    ///
    /// Only access-denied errors are retried; anything else fails the
    /// request so the caller can show an explicit error. Both program
    /// queries draw from one attempt budget.
    pub async fn closable_token_accounts(
        &self,
        owner: &WalletAddress,
    ) -> Result<Vec<TokenAccount>, NetworkError> {
        let mut accounts = Vec::new();
        let mut budget = AttemptBudget::new(self.max_attempts);
        for program_id in [TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID] {
            let params = json!([
                owner.as_str(),
                { "programId": program_id },
                { "encoding": "jsonParsed", "commitment": "confirmed" },
            ]);
            let transport = &self.transport;
            let found = with_failover_budget(&self.rpc, &mut budget, RetryMode::FailFast, |endpoint| {
                let params = params.clone();
                async move {
                    let result = transport
                        .call(&endpoint, "getTokenAccountsByOwner", params)
                        .await?;
                    parse_accounts(program_id, result)
                }
            })
            .await?;
            accounts.extend(found);
        }

        accounts.sort_by(|a, b| a.pubkey.cmp(&b.pubkey));
        info!(owner = %owner, closable = accounts.len(), "listed token accounts");
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(pubkey: &str, amount: &str, state: &str, lamports: u64) -> Value {
        json!({
            "pubkey": pubkey,
            "account": {
                "lamports": lamports,
                "owner": TOKEN_PROGRAM_ID,
                "data": {
                    "program": "spl-token",
                    "parsed": {
                        "type": "account",
                        "info": {
                            "mint": "So11111111111111111111111111111111111111112",
                            "owner": "11111111111111111111111111111111",
                            "state": state,
                            "tokenAmount": {
                                "amount": amount,
                                "decimals": 9,
                                "uiAmount": 0.0,
                                "uiAmountString": "0"
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn keeps_only_empty_unfrozen_accounts() {
        let result = json!({
            "context": { "slot": 1 },
            "value": [
                keyed("acc-empty", "0", "initialized", 2_039_280),
                keyed("acc-funded", "15", "initialized", 2_039_280),
                keyed("acc-frozen", "0", "frozen", 2_039_280),
            ]
        });
        let accounts = parse_accounts(TOKEN_PROGRAM_ID, result).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].pubkey, "acc-empty");
        assert_eq!(accounts[0].lamports, 2_039_280);
        assert!(accounts[0].is_empty);
        assert_eq!(accounts[0].program_id, TOKEN_PROGRAM_ID);
    }

    #[test]
    fn malformed_result_is_invalid_response() {
        let err = parse_accounts(TOKEN_PROGRAM_ID, json!({ "value": 3 })).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidResponse(_)));
    }
}
