//! error types for the mixing engine
//!
//! four families: validation (retry with corrected inputs), cryptographic
//! (regenerate the proof against a fresh root), integrity (non-retriable,
//! an attempted double-spend or replay), administrative (wait for the
//! operator). every error is reported synchronously and leaves no partial
//! state.

use thiserror::Error;

use crate::commitment::PoolId;
use tumbler_groth16::Groth16Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixerError {
    // validation
    #[error("invalid delay range: min {min} exceeds max {max}")]
    InvalidDelayRange { min: u64, max: u64 },

    #[error("invalid merkle depth {0}: must be 1..=32")]
    InvalidDepth(usize),

    #[error("invalid amount {0}")]
    InvalidAmount(u128),

    #[error("fee {fee} exceeds amount {amount}")]
    FeeExceedsAmount { amount: u128, fee: u128 },

    #[error("mixing delay {delay} outside pool range {min}..={max}")]
    InvalidDelay { delay: u64, min: u64, max: u64 },

    #[error("invalid recipient: zero address")]
    InvalidRecipient,

    #[error("invalid commitment: zero value")]
    InvalidCommitment,

    #[error("batch of {len} exceeds configured maximum {max}")]
    BatchSizeExceeded { len: usize, max: usize },

    // cryptographic
    #[error("proof verification failed")]
    InvalidProof,

    #[error("merkle root is neither current nor in recent history")]
    UnknownRoot,

    #[error("proof material malformed: {0}")]
    Verifier(#[from] Groth16Error),

    #[error("no verification key configured for deposit bindings")]
    BindingUnavailable,

    // integrity
    #[error("commitment already recorded")]
    DuplicateCommitment,

    #[error("nullifier already spent")]
    NullifierReused,

    #[error("pool {0} accumulator is full")]
    TreeFull(PoolId),

    #[error("leaf index {0} has not been inserted")]
    UnknownLeaf(u64),

    // administrative
    #[error("engine is paused")]
    Paused,

    #[error("pool {0} is not active")]
    PoolInactive(PoolId),

    #[error("pool {0} does not exist")]
    PoolNotFound(PoolId),

    #[error("caller is not the owner")]
    Unauthorized,

    #[error("vault balance {have} below requested {need}")]
    InsufficientVault { have: u128, need: u128 },

    #[error("transfer batch not ready until {ready_at}")]
    BatchNotReady { ready_at: u64 },

    #[error("no transfer batch is open")]
    NoOpenBatch,
}

pub type Result<T> = std::result::Result<T, MixerError>;
