//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::{LmdbError, LmdbReferralStore};

/// Named databases opened in every environment.
const MAX_DBS: u32 = 8;

/// Default map size: 1 GiB of address space, not disk.
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    /// `wallet_bytes ++ id_be` -> bincode(ReferralEarning)
    pub(crate) earnings_db: Database<Bytes, Bytes>,
    /// `wallet_bytes` -> bincode(ReferralStat)
    pub(crate) stats_db: Database<Bytes, Bytes>,
    /// `wallet_bytes ++ burn_signature` -> id_be
    pub(crate) burns_db: Database<Bytes, Bytes>,
    /// counters
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path and
        // the memory map is never modified outside of LMDB transactions.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let earnings_db = env.create_database(&mut wtxn, Some("earnings"))?;
        let stats_db = env.create_database(&mut wtxn, Some("stats"))?;
        let burns_db = env.create_database(&mut wtxn, Some("burns"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        info!(path = %path.display(), "opened referral ledger");

        Ok(Self {
            env,
            earnings_db,
            stats_db,
            burns_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// A referral store backed by this environment.
    pub fn referral_store(&self) -> LmdbReferralStore {
        LmdbReferralStore {
            env: self.env.clone(),
            earnings_db: self.earnings_db,
            stats_db: self.stats_db,
            burns_db: self.burns_db,
            meta_db: self.meta_db,
        }
    }
}
