//! Service fee configuration.

use reclaim_types::{Lamports, WalletAddress};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Flat fee charged on each burn transaction.
    #[serde(default = "default_service_fee_lamports")]
    pub service_fee_lamports: Lamports,

    /// Wallet that receives the protocol share.
    #[serde(default)]
    pub treasury_wallet: Option<WalletAddress>,
}

fn default_service_fee_lamports() -> Lamports {
    100_000
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            service_fee_lamports: default_service_fee_lamports(),
            treasury_wallet: None,
        }
    }
}
