//! observable events
//!
//! monitoring telemetry accumulated by the engine and drained by the
//! caller. protocol state rolls back atomically on failure; the event
//! buffer additionally records rejected proof verifications, which a
//! reverting ledger could not surface.

use serde::Serialize;

use tumbler_merkle::Hash;

use crate::commitment::{Address, Commitment, NullifierHash, PoolId};
use crate::PROOF_DIGEST_DOMAIN;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PoolEvent {
    DepositCreated {
        commitment: Commitment,
        amount: u128,
        pool_id: PoolId,
        timestamp: u64,
    },
    WithdrawalExecuted {
        nullifier_hash: NullifierHash,
        recipient: Address,
        amount: u128,
        timestamp: u64,
    },
    ProofVerified {
        proof_id: [u8; 32],
        success: bool,
    },
    MixingPoolUpdated {
        pool_id: PoolId,
        new_root: Hash,
    },
}

/// stable identifier for a proof in the event stream
pub fn proof_digest(proof_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(PROOF_DIGEST_DOMAIN);
    hasher.update(proof_bytes);
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_digest_stable() {
        let bytes = [7u8; 256];
        assert_eq!(proof_digest(&bytes), proof_digest(&bytes));
        assert_ne!(proof_digest(&bytes), proof_digest(&[8u8; 256]));
    }
}
