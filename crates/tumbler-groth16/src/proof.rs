//! proof objects
//!
//! a proof is three curve points, constructed off-system per withdrawal,
//! consumed once by `verify` and never stored. wire layout is
//! a(64) || b(128) || c(64), 256 bytes total.

use ark_bn254::{G1Affine, G2Affine};

use crate::curve::{validate_g1, validate_g2};
use crate::error::{Groth16Error, Result};
use crate::key::{g1_from_bytes, g1_to_bytes, g2_from_bytes, g2_to_bytes, G1_ENCODED_LEN, G2_ENCODED_LEN};

pub const PROOF_ENCODED_LEN: usize = 2 * G1_ENCODED_LEN + G2_ENCODED_LEN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub a: G1Affine,
    pub b: G2Affine,
    pub c: G1Affine,
}

impl Proof {
    /// build a proof from points, rejecting off-curve input immediately
    pub fn new(a: G1Affine, b: G2Affine, c: G1Affine) -> Result<Self> {
        validate_g1(&a)?;
        validate_g2(&b)?;
        validate_g1(&c)?;
        Ok(Self { a, b, c })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PROOF_ENCODED_LEN {
            return Err(Groth16Error::MalformedEncoding {
                expected: PROOF_ENCODED_LEN,
                got: bytes.len(),
            });
        }
        let mut a = [0u8; G1_ENCODED_LEN];
        let mut b = [0u8; G2_ENCODED_LEN];
        let mut c = [0u8; G1_ENCODED_LEN];
        a.copy_from_slice(&bytes[..64]);
        b.copy_from_slice(&bytes[64..192]);
        c.copy_from_slice(&bytes[192..]);
        Self::new(g1_from_bytes(&a)?, g2_from_bytes(&b)?, g1_from_bytes(&c)?)
    }

    pub fn to_bytes(&self) -> [u8; PROOF_ENCODED_LEN] {
        let mut out = [0u8; PROOF_ENCODED_LEN];
        out[..64].copy_from_slice(&g1_to_bytes(&self.a));
        out[64..192].copy_from_slice(&g2_to_bytes(&self.b));
        out[192..].copy_from_slice(&g1_to_bytes(&self.c));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    #[test]
    fn test_round_trip() {
        let proof = Proof::new(
            G1Affine::generator(),
            G2Affine::generator(),
            G1Affine::generator(),
        )
        .unwrap();
        let bytes = proof.to_bytes();
        assert_eq!(Proof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert_eq!(
            Proof::from_bytes(&[0u8; 255]),
            Err(Groth16Error::MalformedEncoding {
                expected: PROOF_ENCODED_LEN,
                got: 255
            })
        );
    }

    #[test]
    fn test_tampered_point_rejected() {
        let proof = Proof::new(
            G1Affine::generator(),
            G2Affine::generator(),
            G1Affine::generator(),
        )
        .unwrap();
        let mut bytes = proof.to_bytes().to_vec();
        bytes[10] ^= 0x40;
        assert!(Proof::from_bytes(&bytes).is_err());
    }
}
