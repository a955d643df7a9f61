//! Service fee split.

use reclaim_types::{Lamports, WalletAddress};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub protocol_share: Lamports,
    pub referrer_share: Lamports,
}

impl FeeSplit {
    pub fn total(&self) -> Lamports {
        self.protocol_share + self.referrer_share
    }
}

/// Split `total_fee` between the protocol and `referrer`.
///
/// The referrer gets `floor(total_fee / 2)` and the protocol the remainder,
/// so the two shares always add up to `total_fee` exactly. Without a
/// referrer the protocol keeps everything.
pub fn split_fee(total_fee: Lamports, referrer: Option<&WalletAddress>) -> FeeSplit {
    let referrer_share = match referrer {
        Some(_) => total_fee / 2,
        None => 0,
    };
    FeeSplit {
        protocol_share: total_fee - referrer_share,
        referrer_share,
    }
}
