//! core identifier types
//!
//! a commitment hides (secret, amount, nullifier seed) behind a hash and
//! is the only thing an observer sees at deposit time. the nullifier hash
//! is derived from the same secret material and surfaces only at
//! withdrawal, so spends cannot be linked back to deposits but each
//! deposit can be spent exactly once.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{COMMITMENT_DOMAIN, NULLIFIER_DOMAIN};

/// hiding commitment to one deposit, inserted as a merkle leaf
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    /// commitment = H(secret, amount, nullifier_seed)
    pub fn derive(secret: &[u8; 32], amount: u128, nullifier_seed: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(COMMITMENT_DOMAIN);
        hasher.update(secret);
        hasher.update(&amount.to_le_bytes());
        hasher.update(nullifier_seed);
        Self(*hasher.finalize().as_bytes())
    }

    /// enhanced variant binding a per-deposit fee into the commitment
    pub fn derive_with_fee(
        secret: &[u8; 32],
        amount: u128,
        nullifier_seed: &[u8; 32],
        fee: u128,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(COMMITMENT_DOMAIN);
        hasher.update(secret);
        hasher.update(&amount.to_le_bytes());
        hasher.update(nullifier_seed);
        hasher.update(&fee.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// one-time-use spend token, revealed at withdrawal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NullifierHash(pub [u8; 32]);

impl NullifierHash {
    /// nullifier hash = H(secret, nullifier_seed)
    ///
    /// deterministic per deposit: two distinct deposits cannot share a
    /// nullifier without sharing the secret material
    pub fn derive(secret: &[u8; 32], nullifier_seed: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(NULLIFIER_DOMAIN);
        hasher.update(secret);
        hasher.update(nullifier_seed);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl AsRef<[u8]> for NullifierHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// recipient address; the zero address is never a valid destination
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// sequential pool identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_deterministic() {
        let secret = [1u8; 32];
        let seed = [2u8; 32];
        assert_eq!(
            Commitment::derive(&secret, 1000, &seed),
            Commitment::derive(&secret, 1000, &seed)
        );
        assert_ne!(
            Commitment::derive(&secret, 1000, &seed),
            Commitment::derive(&secret, 1001, &seed)
        );
        assert_ne!(
            Commitment::derive(&secret, 1000, &seed),
            Commitment::derive(&[3u8; 32], 1000, &seed)
        );
    }

    #[test]
    fn test_fee_variant_distinct() {
        let secret = [1u8; 32];
        let seed = [2u8; 32];
        assert_ne!(
            Commitment::derive(&secret, 1000, &seed),
            Commitment::derive_with_fee(&secret, 1000, &seed, 10)
        );
    }

    #[test]
    fn test_nullifier_domain_separated() {
        // same preimage material, different domains, different digests
        let secret = [7u8; 32];
        let seed = [9u8; 32];
        let nullifier = NullifierHash::derive(&secret, &seed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(COMMITMENT_DOMAIN);
        hasher.update(&secret);
        hasher.update(&seed);
        assert_ne!(nullifier.0, *hasher.finalize().as_bytes());
    }

    #[test]
    fn test_zero_checks() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address([1u8; 32]).is_zero());
        assert!(Commitment([0u8; 32]).is_zero());
        assert!(NullifierHash([0u8; 32]).is_zero());
    }
}
