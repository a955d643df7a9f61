//! Referral earnings bookkeeping.
//!
//! The ledger is the only writer of referral earnings and statistics. It is
//! also the source of truth for claim status: claims have no on-chain
//! representation, so a claim transfer is not final until
//! [`FeeLedger::claim_earnings`] succeeds.
//!
//! Store calls block; async callers run them on a blocking thread.

use std::sync::Arc;

use reclaim_store::{NewEarning, ReferralEarning, ReferralStat, ReferralStore};
use reclaim_types::{Clock, Lamports, TxSignature, WalletAddress};
use serde::Serialize;
use tracing::{info, warn};

use crate::{split_fee, FeeConfig, FeeSplit, LedgerError};

/// What happened to the referrer's share of a settled burn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attribution {
    /// No referrer, or a share too small to record.
    None,
    Recorded(ReferralEarning),
    /// The ledger write failed; the protocol still collected its fee.
    Lost(String),
}

impl Attribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribution::None => "none",
            Attribution::Recorded(_) => "recorded",
            Attribution::Lost(_) => "lost",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnSettlement {
    pub total_fee: Lamports,
    pub split: FeeSplit,
    pub attribution: Attribution,
}

/// Wire form of a fee quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub total_fee: Lamports,
    pub protocol_share: Lamports,
    pub referrer_share: Lamports,
    pub treasury: Option<WalletAddress>,
}

pub struct FeeLedger {
    store: Arc<dyn ReferralStore>,
    clock: Arc<dyn Clock>,
    fees: FeeConfig,
}

impl FeeLedger {
    pub fn new(store: Arc<dyn ReferralStore>, clock: Arc<dyn Clock>, fees: FeeConfig) -> Self {
        Self { store, clock, fees }
    }

    pub fn fees(&self) -> &FeeConfig {
        &self.fees
    }

    /// Split of the configured service fee for a burn paid by `payer`.
    /// A wallet referring itself earns nothing.
    pub fn split_for(
        &self,
        payer: Option<&WalletAddress>,
        referrer: Option<&WalletAddress>,
    ) -> FeeSplit {
        let referrer = referrer.filter(|r| Some(*r) != payer);
        split_fee(self.fees.service_fee_lamports, referrer)
    }

    pub fn quote(&self, payer: Option<&WalletAddress>, referrer: Option<&WalletAddress>) -> FeeQuote {
        let split = self.split_for(payer, referrer);
        FeeQuote {
            total_fee: self.fees.service_fee_lamports,
            protocol_share: split.protocol_share,
            referrer_share: split.referrer_share,
            treasury: self.fees.treasury_wallet.clone(),
        }
    }

    /// Record `amount` as an unclaimed earning of `referrer` for `burn_tx`
    /// and update the referrer's statistics in the same transaction.
    pub fn record_earning(
        &self,
        referrer: &WalletAddress,
        amount: Lamports,
        burn_tx: &TxSignature,
    ) -> Result<ReferralEarning, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidInput("amount must be positive".into()));
        }
        let earning = NewEarning {
            referrer_wallet: referrer.clone(),
            amount,
            burn_tx: burn_tx.clone(),
        };
        let record = self.store.record_earning(&earning, self.clock.now())?;
        info!(id = record.id, referrer = %referrer, amount, burn_tx = %burn_tx, "referral earning recorded");
        Ok(record)
    }

    /// Claim every unclaimed earning of `referrer`. Returns the claimed
    /// total, or `0` when there was nothing left to claim.
    pub fn claim_earnings(
        &self,
        referrer: &WalletAddress,
        claim_tx: &TxSignature,
    ) -> Result<Lamports, LedgerError> {
        let claimed = self
            .store
            .claim_earnings(referrer, claim_tx, self.clock.now())?;
        if claimed > 0 {
            info!(referrer = %referrer, claimed, claim_tx = %claim_tx, "referral earnings claimed");
        }
        Ok(claimed)
    }

    pub fn earnings(&self, referrer: &WalletAddress) -> Result<Vec<ReferralEarning>, LedgerError> {
        Ok(self.store.earnings_for(referrer)?)
    }

    pub fn stats(&self, referrer: &WalletAddress) -> Result<Option<ReferralStat>, LedgerError> {
        Ok(self.store.stats_for(referrer)?)
    }

    /// Fee settlement for one burn transaction.
    ///
    /// Ledger failures never fail the settlement: the protocol share is
    /// collected on-chain regardless and only the referral attribution is
    /// lost.
    pub fn settle_burn(
        &self,
        payer: &WalletAddress,
        referrer: Option<&WalletAddress>,
        burn_tx: &TxSignature,
    ) -> BurnSettlement {
        let split = self.split_for(Some(payer), referrer);
        let attribution = match referrer {
            Some(referrer) if split.referrer_share > 0 => {
                match self.record_earning(referrer, split.referrer_share, burn_tx) {
                    Ok(record) => Attribution::Recorded(record),
                    Err(LedgerError::AlreadyRecorded(_)) => self.existing_attribution(referrer, burn_tx),
                    Err(e) => {
                        warn!(referrer = %referrer, burn_tx = %burn_tx, error = %e, "referral attribution lost");
                        Attribution::Lost(e.to_string())
                    }
                }
            }
            _ => Attribution::None,
        };
        BurnSettlement {
            total_fee: self.fees.service_fee_lamports,
            split,
            attribution,
        }
    }

    /// Attribution for a burn settled before: the earning already on the
    /// ledger. The ledger is left untouched.
    fn existing_attribution(&self, referrer: &WalletAddress, burn_tx: &TxSignature) -> Attribution {
        match self.earnings(referrer) {
            Ok(earnings) => match earnings.into_iter().find(|e| &e.burn_tx == burn_tx) {
                Some(record) => {
                    info!(id = record.id, referrer = %referrer, burn_tx = %burn_tx, "burn already settled");
                    Attribution::Recorded(record)
                }
                None => {
                    warn!(referrer = %referrer, burn_tx = %burn_tx, "burn reported as recorded but no earning found");
                    Attribution::Lost(format!("no earning found for burn {burn_tx}"))
                }
            },
            Err(e) => {
                warn!(referrer = %referrer, burn_tx = %burn_tx, error = %e, "referral attribution lost");
                Attribution::Lost(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_nullables::{NullClock, NullReferralStore};

    fn wallet(seed: u8) -> WalletAddress {
        WalletAddress::from_bytes(&[seed; 32])
    }

    fn sig(seed: u8) -> TxSignature {
        TxSignature::from_bytes(&[seed; 64])
    }

    fn ledger() -> (Arc<NullReferralStore>, Arc<NullClock>, FeeLedger) {
        let store = Arc::new(NullReferralStore::new());
        let clock = Arc::new(NullClock::new(1_000));
        let ledger = FeeLedger::new(store.clone(), clock.clone(), FeeConfig::default());
        (store, clock, ledger)
    }

    #[test]
    fn record_record_claim_claim() {
        let (_store, _clock, ledger) = ledger();
        let w = wallet(1);
        ledger.record_earning(&w, 100, &sig(1)).unwrap();
        ledger.record_earning(&w, 50, &sig(2)).unwrap();
        assert_eq!(ledger.claim_earnings(&w, &sig(3)).unwrap(), 150);
        assert_eq!(ledger.claim_earnings(&w, &sig(4)).unwrap(), 0);

        let stats = ledger.stats(&w).unwrap().unwrap();
        assert_eq!(stats.total_earned, 150);
        assert_eq!(stats.total_claimed, 150);
        assert_eq!(stats.total_burns, 2);
    }

    #[test]
    fn second_claim_batch_adds_to_total_claimed() {
        let (_store, _clock, ledger) = ledger();
        let w = wallet(1);
        ledger.record_earning(&w, 100, &sig(1)).unwrap();
        assert_eq!(ledger.claim_earnings(&w, &sig(2)).unwrap(), 100);
        ledger.record_earning(&w, 40, &sig(3)).unwrap();
        assert_eq!(ledger.claim_earnings(&w, &sig(4)).unwrap(), 40);

        let stats = ledger.stats(&w).unwrap().unwrap();
        assert_eq!(stats.total_claimed, 140);
        assert_eq!(stats.total_claimed, stats.total_earned);
    }

    #[test]
    fn zero_amount_is_invalid() {
        let (_store, _clock, ledger) = ledger();
        let err = ledger.record_earning(&wallet(1), 0, &sig(1)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn duplicate_burn_is_rejected() {
        let (_store, _clock, ledger) = ledger();
        ledger.record_earning(&wallet(1), 10, &sig(1)).unwrap();
        let err = ledger.record_earning(&wallet(1), 10, &sig(1)).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyRecorded(_)));
    }

    #[test]
    fn store_outage_is_a_persistence_error() {
        let (store, _clock, ledger) = ledger();
        store.set_unavailable(true);
        let err = ledger.claim_earnings(&wallet(1), &sig(1)).unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
    }

    #[test]
    fn timestamps_come_from_the_clock() {
        let (_store, clock, ledger) = ledger();
        let w = wallet(1);
        ledger.record_earning(&w, 10, &sig(1)).unwrap();
        clock.advance(60);
        ledger.claim_earnings(&w, &sig(2)).unwrap();

        let earning = &ledger.earnings(&w).unwrap()[0];
        assert_eq!(earning.created_at.as_secs(), 1_000);
        assert_eq!(earning.updated_at.as_secs(), 1_060);
        assert_eq!(ledger.stats(&w).unwrap().unwrap().last_updated.as_secs(), 1_060);
    }

    #[test]
    fn settle_burn_records_referrer_share() {
        let (_store, _clock, ledger) = ledger();
        let settlement = ledger.settle_burn(&wallet(1), Some(&wallet(2)), &sig(1));
        assert_eq!(settlement.split.referrer_share, 50_000);
        assert_eq!(settlement.split.protocol_share, 50_000);
        match settlement.attribution {
            Attribution::Recorded(record) => {
                assert_eq!(record.referrer_wallet, wallet(2));
                assert_eq!(record.amount, 50_000);
            }
            other => panic!("expected recorded attribution, got {other:?}"),
        }
    }

    #[test]
    fn repeated_settlement_reports_existing_earning() {
        let (_store, _clock, ledger) = ledger();
        let first = ledger.settle_burn(&wallet(1), Some(&wallet(2)), &sig(1));
        let second = ledger.settle_burn(&wallet(1), Some(&wallet(2)), &sig(1));

        assert_eq!(second.attribution.as_str(), "recorded");
        assert_eq!(first.attribution, second.attribution);

        let stats = ledger.stats(&wallet(2)).unwrap().unwrap();
        assert_eq!(stats.total_burns, 1);
        assert_eq!(stats.total_earned, 50_000);
        assert_eq!(ledger.earnings(&wallet(2)).unwrap().len(), 1);
    }

    #[test]
    fn settle_burn_survives_ledger_outage() {
        let (store, _clock, ledger) = ledger();
        store.set_unavailable(true);
        let settlement = ledger.settle_burn(&wallet(1), Some(&wallet(2)), &sig(1));
        assert_eq!(settlement.split.total(), 100_000);
        assert_eq!(settlement.attribution.as_str(), "lost");
    }

    #[test]
    fn self_referral_earns_nothing() {
        let (_store, _clock, ledger) = ledger();
        let settlement = ledger.settle_burn(&wallet(1), Some(&wallet(1)), &sig(1));
        assert_eq!(settlement.split.referrer_share, 0);
        assert_eq!(settlement.split.protocol_share, 100_000);
        assert_eq!(settlement.attribution, Attribution::None);
        assert!(ledger.stats(&wallet(1)).unwrap().is_none());
    }

    #[test]
    fn one_lamport_fee_records_nothing() {
        let store = Arc::new(NullReferralStore::new());
        let ledger = FeeLedger::new(
            store,
            Arc::new(NullClock::new(0)),
            FeeConfig {
                service_fee_lamports: 1,
                treasury_wallet: None,
            },
        );
        let settlement = ledger.settle_burn(&wallet(1), Some(&wallet(2)), &sig(1));
        assert_eq!(settlement.split.protocol_share, 1);
        assert_eq!(settlement.attribution, Attribution::None);
    }

    #[test]
    fn quote_serializes_camel_case() {
        let (_store, _clock, ledger) = ledger();
        let quote = ledger.quote(None, Some(&wallet(2)));
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["totalFee"], 100_000);
        assert_eq!(json["referrerShare"], 50_000);
        assert_eq!(json["treasury"], serde_json::Value::Null);
    }
}
