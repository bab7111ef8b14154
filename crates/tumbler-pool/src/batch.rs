//! anti-correlation transfer batching
//!
//! the enhanced withdrawal path does not pay out immediately: verified
//! withdrawals move their net value into an open batch, the batch is held
//! for a minimum period, and payouts leave in a pseudo-random order. the
//! timing and ordering of payouts then carries no information about the
//! order the proofs arrived in.

use serde::Serialize;

use crate::commitment::{Address, NullifierHash};
use crate::error::{MixerError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PendingTransfer {
    pub nullifier_hash: NullifierHash,
    pub recipient: Address,
    /// net value owed, fee already accrued at queue time
    pub amount: u128,
}

#[derive(Clone, Debug)]
pub(crate) struct TransferBatch {
    pub id: u64,
    pub created_at: u64,
    pub escrow: u128,
    pub transfers: Vec<PendingTransfer>,
}

/// snapshot of the open batch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BatchInfo {
    pub id: u64,
    pub created_at: u64,
    pub pending: usize,
    pub escrow: u128,
}

/// single open batch plus a monotonic id counter
#[derive(Default)]
pub(crate) struct BatchQueue {
    next_id: u64,
    open: Option<TransferBatch>,
}

impl BatchQueue {
    /// add a transfer to the open batch, opening one if needed
    pub fn push(&mut self, now: u64, transfer: PendingTransfer) -> u64 {
        let batch = self.open.get_or_insert_with(|| {
            let id = self.next_id;
            self.next_id += 1;
            TransferBatch {
                id,
                created_at: now,
                escrow: 0,
                transfers: Vec::new(),
            }
        });
        batch.escrow += transfer.amount;
        batch.transfers.push(transfer);
        batch.id
    }

    /// close and return the open batch once the hold has elapsed
    pub fn take_ready(&mut self, now: u64, hold: u64) -> Result<TransferBatch> {
        let created_at = match &self.open {
            Some(batch) => batch.created_at,
            None => return Err(MixerError::NoOpenBatch),
        };
        let ready_at = created_at.saturating_add(hold);
        if now < ready_at {
            return Err(MixerError::BatchNotReady { ready_at });
        }
        // checked above
        self.open.take().ok_or(MixerError::NoOpenBatch)
    }

    pub fn info(&self) -> Option<BatchInfo> {
        self.open.as_ref().map(|b| BatchInfo {
            id: b.id,
            created_at: b.created_at,
            pending: b.transfers.len(),
            escrow: b.escrow,
        })
    }
}
