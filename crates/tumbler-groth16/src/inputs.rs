//! public-input embedding into the bn254 scalar field
//!
//! public inputs bind a proof to one specific withdrawal: merkle root,
//! nullifier hash, recipient, amount, fee. hashes and addresses are 32
//! bytes and land in the field by big-endian reduction mod r (the circuit
//! side applies the same reduction); integers embed exactly.

use ark_bn254::Fr;
use ark_ff::PrimeField;

/// 32-byte digest or address -> field element, big-endian, reduced mod r
pub fn fr_from_hash(bytes: &[u8; 32]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

pub fn fr_from_u64(value: u64) -> Fr {
    Fr::from(value)
}

pub fn fr_from_u128(value: u128) -> Fr {
    Fr::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{BigInteger, Zero};

    #[test]
    fn test_integer_embedding_is_exact() {
        let x = fr_from_u64(0x0102030405060708);
        let bytes = x.into_bigint().to_bytes_be();
        assert_eq!(&bytes[24..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_hash_embedding_deterministic() {
        let h = [0xabu8; 32];
        assert_eq!(fr_from_hash(&h), fr_from_hash(&h));
        assert_ne!(fr_from_hash(&h), fr_from_hash(&[0xacu8; 32]));
    }

    #[test]
    fn test_zero_hash_is_zero() {
        assert!(fr_from_hash(&[0u8; 32]).is_zero());
    }
}
