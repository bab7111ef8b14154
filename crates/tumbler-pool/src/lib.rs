//! tumbler mixing-pool engine
//!
//! privacy-preserving value mixing: depositors lock value under a hidden
//! commitment, wait a randomized delay, then withdraw to an unlinked
//! recipient with a zero-knowledge membership proof
//!
//! # architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       MIXER ENGINE                         │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  deposit(commitment)                                       │
//! │  ├─ registry: commitment -> deposit record                 │
//! │  ├─ accumulator: leaf append, new root                     │
//! │  └─ pool totals, release jitter                            │
//! │                                                            │
//! │  withdraw(nullifier, recipient, amount, fee, proof)        │
//! │  ├─ nullifier set: double-spend defense                    │
//! │  ├─ groth16: proof bound to (root, nullifier,              │
//! │  │           recipient, amount, fee)                       │
//! │  └─ transfer amount - fee, accrue fee                      │
//! │                                                            │
//! │  every public operation is one serialized critical         │
//! │  section: commits fully or leaves no trace                 │
//! │                                                            │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod clock;
pub mod commitment;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod obfuscation;
pub mod pool;
pub mod registry;

pub use batch::BatchInfo;
pub use clock::{Clock, ManualClock, SystemClock};
pub use commitment::{Address, Commitment, NullifierHash, PoolId};
pub use config::MixerConfig;
pub use engine::{
    withdrawal_inputs, DepositBinding, DepositReceipt, MixerBuilder, MixerEngine,
    WithdrawReceipt, WithdrawRequest,
};
pub use error::{MixerError, Result};
pub use events::{proof_digest, PoolEvent};
pub use obfuscation::{ObfuscationStrategy, SeededShuffle};
pub use pool::{DepositInfo, PoolInfo, PoolParams};
pub use registry::{DepositRecord, MemoryRegistry, Registry};

/// domain separator for deposit commitments
pub const COMMITMENT_DOMAIN: &[u8] = b"tumbler.commitment.v1";
/// domain separator for nullifier hashes
pub const NULLIFIER_DOMAIN: &[u8] = b"tumbler.nullifier.v1";
/// domain separator for proof digests in events
pub const PROOF_DIGEST_DOMAIN: &[u8] = b"tumbler.proof.digest.v1";

/// deepest pool accumulator allowed
pub const MAX_POOL_DEPTH: usize = tumbler_merkle::MAX_DEPTH;
