//! commitment/nullifier registry
//!
//! the source of double-spend-freedom: a commitment can be recorded once,
//! a nullifier can be marked spent once. the store sits behind a trait so
//! tests can assert exact mutation sequences and a deployment can bind it
//! to persistent state.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::commitment::{Commitment, NullifierHash, PoolId};
use crate::error::{MixerError, Result};

/// audit record for one deposit, keyed by commitment; never deleted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub amount: u128,
    pub timestamp: u64,
    pub mixing_delay: u64,
    pub release_jitter: u64,
    pub pool_id: PoolId,
    pub withdrawn: bool,
}

impl DepositRecord {
    /// advisory release time: requested delay plus anti-correlation jitter
    pub fn release_at(&self) -> u64 {
        self.timestamp
            .saturating_add(self.mixing_delay)
            .saturating_add(self.release_jitter)
    }
}

pub trait Registry: Send {
    /// create a deposit record; fails if the commitment is already known
    fn record_deposit(&mut self, commitment: Commitment, record: DepositRecord) -> Result<()>;

    fn deposit(&self, commitment: &Commitment) -> Option<&DepositRecord>;

    /// flip the audit flag; idempotence is the caller's concern
    fn mark_withdrawn(&mut self, commitment: &Commitment);

    /// mark a nullifier spent; fails if it already is
    fn mark_spent(&mut self, nullifier: NullifierHash) -> Result<()>;

    fn is_spent(&self, nullifier: &NullifierHash) -> bool;

    /// privately remember which commitment a nullifier belongs to
    /// (populated only by verified deposit bindings, never exposed)
    fn link_nullifier(&mut self, nullifier: NullifierHash, commitment: Commitment);

    fn linked_commitment(&self, nullifier: &NullifierHash) -> Option<Commitment>;

    fn deposit_count(&self) -> usize;

    fn spent_count(&self) -> usize;
}

/// in-memory registry binding
#[derive(Default)]
pub struct MemoryRegistry {
    deposits: HashMap<Commitment, DepositRecord>,
    spent: HashSet<NullifierHash>,
    links: HashMap<NullifierHash, Commitment>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Registry for MemoryRegistry {
    fn record_deposit(&mut self, commitment: Commitment, record: DepositRecord) -> Result<()> {
        if self.deposits.contains_key(&commitment) {
            return Err(MixerError::DuplicateCommitment);
        }
        self.deposits.insert(commitment, record);
        Ok(())
    }

    fn deposit(&self, commitment: &Commitment) -> Option<&DepositRecord> {
        self.deposits.get(commitment)
    }

    fn mark_withdrawn(&mut self, commitment: &Commitment) {
        if let Some(record) = self.deposits.get_mut(commitment) {
            record.withdrawn = true;
        }
    }

    fn mark_spent(&mut self, nullifier: NullifierHash) -> Result<()> {
        if !self.spent.insert(nullifier) {
            return Err(MixerError::NullifierReused);
        }
        Ok(())
    }

    fn is_spent(&self, nullifier: &NullifierHash) -> bool {
        self.spent.contains(nullifier)
    }

    fn link_nullifier(&mut self, nullifier: NullifierHash, commitment: Commitment) {
        self.links.insert(nullifier, commitment);
    }

    fn linked_commitment(&self, nullifier: &NullifierHash) -> Option<Commitment> {
        self.links.get(nullifier).copied()
    }

    fn deposit_count(&self) -> usize {
        self.deposits.len()
    }

    fn spent_count(&self) -> usize {
        self.spent.len()
    }
}
