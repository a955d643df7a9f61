//! Token metadata enrichment via DAS `getAssetBatch`.
//!
//! Metadata is cosmetic: every failure degrades to fewer (or zero) results
//! and never to an error, so the account list still renders with
//! placeholders.

use reclaim_types::WalletAddress;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::failover::{with_failover, RetryMode};
use crate::transport::JsonRpcTransport;
use crate::{Upstream, UpstreamError};

/// Largest id list a single `getAssetBatch` call accepts.
pub const MAX_BATCH: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub image: Option<String>,
}

#[derive(Deserialize)]
struct Asset {
    id: String,
    #[serde(default)]
    content: Option<AssetContent>,
}

#[derive(Default, Deserialize)]
struct AssetContent {
    #[serde(default)]
    metadata: Option<AssetMetadata>,
    #[serde(default)]
    links: Option<AssetLinks>,
    #[serde(default)]
    files: Vec<AssetFile>,
}

#[derive(Default, Deserialize)]
struct AssetMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

#[derive(Deserialize)]
struct AssetLinks {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
struct AssetFile {
    #[serde(default)]
    uri: Option<String>,
}

impl From<Asset> for TokenMetadata {
    fn from(asset: Asset) -> Self {
        let content = asset.content.unwrap_or_default();
        let metadata = content.metadata.unwrap_or_default();
        let image = content
            .links
            .and_then(|l| l.image)
            .or_else(|| content.files.into_iter().find_map(|f| f.uri))
            .filter(|uri| !uri.is_empty());
        TokenMetadata {
            mint: asset.id,
            name: metadata.name.unwrap_or_default().trim().to_string(),
            symbol: metadata.symbol.unwrap_or_default().trim().to_string(),
            image,
        }
    }
}

fn parse_assets(result: Value) -> Result<Vec<TokenMetadata>, UpstreamError> {
    let assets: Vec<Option<Asset>> = serde_json::from_value(result)
        .map_err(|e| UpstreamError::InvalidResponse(format!("getAssetBatch: {e}")))?;
    Ok(assets.into_iter().flatten().map(TokenMetadata::from).collect())
}

/// Valid, de-duplicated mint addresses in input order.
pub fn parse_mint_list(raw: &str) -> Vec<String> {
    let mut mints: Vec<String> = Vec::new();
    for candidate in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match WalletAddress::parse(candidate) {
            Ok(mint) => {
                if !mints.iter().any(|m| m == mint.as_str()) {
                    mints.push(mint.as_str().to_string());
                }
            }
            Err(e) => debug!(mint = candidate, error = %e, "skipping invalid mint"),
        }
    }
    mints
}

impl<T: JsonRpcTransport> Upstream<T> {
    /// Metadata for `mints`. Never fails; batches that cannot be fetched
    /// within the retry budget are left out.
    pub async fn token_metadata(&self, mints: &[String]) -> Vec<TokenMetadata> {
        let mut out = Vec::with_capacity(mints.len());
        for batch in mints.chunks(MAX_BATCH) {
            let params = json!({ "ids": batch });
            let transport = &self.transport;
            let fetched = with_failover(&self.das, self.max_attempts, RetryMode::Persistent, |endpoint| {
                let params = params.clone();
                async move {
                    let result = transport.call(&endpoint, "getAssetBatch", params).await?;
                    parse_assets(result)
                }
            })
            .await;

            match fetched {
                Ok(found) => out.extend(found),
                Err(e) => warn!(batch = batch.len(), error = %e, "metadata lookup failed, degrading"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_assets_and_skips_nulls() {
        let result = json!([
            {
                "id": "mint-a",
                "content": {
                    "metadata": { "name": " Bonk ", "symbol": "BONK" },
                    "links": { "image": "https://img/bonk.png" },
                    "files": [{ "uri": "https://files/ignored.png" }]
                }
            },
            null,
            {
                "id": "mint-b",
                "content": {
                    "metadata": { "name": "No Link" },
                    "files": [{ "mime": "image/png" }, { "uri": "https://files/b.png" }]
                }
            },
            { "id": "mint-c" }
        ]);
        let metadata = parse_assets(result).unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata[0].name, "Bonk");
        assert_eq!(metadata[0].image.as_deref(), Some("https://img/bonk.png"));
        assert_eq!(metadata[1].symbol, "");
        assert_eq!(metadata[1].image.as_deref(), Some("https://files/b.png"));
        assert_eq!(
            metadata[2],
            TokenMetadata {
                mint: "mint-c".into(),
                name: String::new(),
                symbol: String::new(),
                image: None,
            }
        );
    }

    #[test]
    fn mint_list_drops_invalid_and_duplicates() {
        let raw = "So11111111111111111111111111111111111111112, nope,,\
                   So11111111111111111111111111111111111111112,TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
        assert_eq!(
            parse_mint_list(raw),
            vec![
                "So11111111111111111111111111111111111111112",
                "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
            ]
        );
        assert!(parse_mint_list("").is_empty());
    }
}
