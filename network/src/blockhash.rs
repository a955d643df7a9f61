//! Latest blockhash for client-side transaction building.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::failover::{with_failover, RetryMode};
use crate::transport::JsonRpcTransport;
use crate::{NetworkError, Upstream, UpstreamError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockhash {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Deserialize)]
struct BlockhashResult {
    value: LatestBlockhash,
}

fn parse_blockhash(result: Value) -> Result<LatestBlockhash, UpstreamError> {
    let parsed: BlockhashResult = serde_json::from_value(result)
        .map_err(|e| UpstreamError::InvalidResponse(format!("getLatestBlockhash: {e}")))?;
    Ok(parsed.value)
}

impl<T: JsonRpcTransport> Upstream<T> {
    pub async fn latest_blockhash(&self) -> Result<LatestBlockhash, NetworkError> {
        let transport = &self.transport;
        with_failover(&self.rpc, self.max_attempts, RetryMode::FailFast, |endpoint| async move {
            let result = transport
                .call(&endpoint, "getLatestBlockhash", json!([{ "commitment": "finalized" }]))
                .await?;
            parse_blockhash(result)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_context_wrapped_value() {
        let result = json!({
            "context": { "slot": 2792 },
            "value": {
                "blockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N",
                "lastValidBlockHeight": 3090
            }
        });
        let hash = parse_blockhash(result).unwrap();
        assert_eq!(hash.last_valid_block_height, 3090);
        assert_eq!(hash.blockhash, "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N");
    }
}
