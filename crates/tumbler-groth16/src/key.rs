//! verification keys and point codecs
//!
//! a key is produced by the trusted setup and supplied once as
//! configuration; it is validated at decode time and never mutated. the
//! byte layout is uncompressed big-endian coordinates:
//!
//! ```text
//! g1: x(32) || y(32)                         = 64 bytes
//! g2: x.c0(32) || x.c1(32) || y.c0(32) || y.c1(32) = 128 bytes
//! ```
//!
//! the all-zero encoding denotes the point at infinity.

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};

use crate::curve::{validate_g1, validate_g2};
use crate::error::{Groth16Error, Result};

pub const G1_ENCODED_LEN: usize = 64;
pub const G2_ENCODED_LEN: usize = 128;

/// groth16 verification key: the pairing anchors plus one
/// input-commitment point per public input (and one constant term)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    pub alpha_g1: G1Affine,
    pub beta_g2: G2Affine,
    pub gamma_g2: G2Affine,
    pub delta_g2: G2Affine,
    pub ic: Vec<G1Affine>,
}

impl VerifyingKey {
    /// build a key from already-decoded points, validating each one
    pub fn new(
        alpha_g1: G1Affine,
        beta_g2: G2Affine,
        gamma_g2: G2Affine,
        delta_g2: G2Affine,
        ic: Vec<G1Affine>,
    ) -> Result<Self> {
        if ic.is_empty() {
            return Err(Groth16Error::EmptyVerifyingKey);
        }
        validate_g1(&alpha_g1)?;
        validate_g2(&beta_g2)?;
        validate_g2(&gamma_g2)?;
        validate_g2(&delta_g2)?;
        for point in &ic {
            validate_g1(point)?;
        }
        Ok(Self {
            alpha_g1,
            beta_g2,
            gamma_g2,
            delta_g2,
            ic,
        })
    }

    /// decode a key from uncompressed byte arrays
    pub fn from_bytes(
        alpha_g1: &[u8; G1_ENCODED_LEN],
        beta_g2: &[u8; G2_ENCODED_LEN],
        gamma_g2: &[u8; G2_ENCODED_LEN],
        delta_g2: &[u8; G2_ENCODED_LEN],
        ic: &[[u8; G1_ENCODED_LEN]],
    ) -> Result<Self> {
        let ic = ic
            .iter()
            .map(g1_from_bytes)
            .collect::<Result<Vec<_>>>()?;
        Self::new(
            g1_from_bytes(alpha_g1)?,
            g2_from_bytes(beta_g2)?,
            g2_from_bytes(gamma_g2)?,
            g2_from_bytes(delta_g2)?,
            ic,
        )
    }

    /// number of public inputs this key expects
    pub fn public_input_len(&self) -> usize {
        self.ic.len() - 1
    }
}

fn fq_to_be(x: &Fq) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&x.into_bigint().to_bytes_be());
    out
}

/// strict decode: the value must already be reduced mod q
fn fq_from_be(bytes: &[u8]) -> Result<Fq> {
    let reduced = Fq::from_be_bytes_mod_order(bytes);
    if fq_to_be(&reduced) != bytes {
        return Err(Groth16Error::NonCanonicalField);
    }
    Ok(reduced)
}

pub(crate) fn g1_from_bytes(bytes: &[u8; G1_ENCODED_LEN]) -> Result<G1Affine> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(G1Affine::identity());
    }
    let x = fq_from_be(&bytes[..32])?;
    let y = fq_from_be(&bytes[32..])?;
    let point = G1Affine::new_unchecked(x, y);
    validate_g1(&point)?;
    Ok(point)
}

pub(crate) fn g1_to_bytes(p: &G1Affine) -> [u8; G1_ENCODED_LEN] {
    let mut out = [0u8; G1_ENCODED_LEN];
    if p.infinity {
        return out;
    }
    out[..32].copy_from_slice(&fq_to_be(&p.x));
    out[32..].copy_from_slice(&fq_to_be(&p.y));
    out
}

pub(crate) fn g2_from_bytes(bytes: &[u8; G2_ENCODED_LEN]) -> Result<G2Affine> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(G2Affine::identity());
    }
    let x = Fq2::new(fq_from_be(&bytes[..32])?, fq_from_be(&bytes[32..64])?);
    let y = Fq2::new(fq_from_be(&bytes[64..96])?, fq_from_be(&bytes[96..])?);
    let point = G2Affine::new_unchecked(x, y);
    validate_g2(&point)?;
    Ok(point)
}

pub(crate) fn g2_to_bytes(p: &G2Affine) -> [u8; G2_ENCODED_LEN] {
    let mut out = [0u8; G2_ENCODED_LEN];
    if p.infinity {
        return out;
    }
    out[..32].copy_from_slice(&fq_to_be(&p.x.c0));
    out[32..64].copy_from_slice(&fq_to_be(&p.x.c1));
    out[64..96].copy_from_slice(&fq_to_be(&p.y.c0));
    out[96..].copy_from_slice(&fq_to_be(&p.y.c1));
    out
}
