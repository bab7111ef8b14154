//! groth16 verification over alt-bn128 (bn254)
//!
//! the verifier side of the mixing protocol's proof system: point
//! validation, the affine group law, scalar multiplication, public-input
//! embedding and the pairing-product check
//!
//! ```text
//! verify(vk, proof, inputs):
//!   every point on-curve (g2 additionally in the r-order subgroup)
//!   vk_x = ic[0] + Σ inputs[i] · ic[i+1]
//!   e(-A, B) · e(alpha, beta) · e(vk_x, gamma) · e(C, delta) == 1
//! ```
//!
//! field arithmetic and the miller loop come from arkworks; the group law
//! and the verification equation are assembled here explicitly. the
//! verifier is a pure function: no state, identical inputs always yield
//! identical output.

pub mod curve;
pub mod error;
pub mod inputs;
pub mod key;
pub mod proof;
pub mod verifier;

pub use curve::{
    add_g1, double_g1, is_on_curve_g1, is_on_curve_g2, negate_g1, scalar_mul_g1, validate_g1,
    validate_g2,
};
pub use error::{Groth16Error, Result};
pub use inputs::{fr_from_hash, fr_from_u128, fr_from_u64};
pub use key::{VerifyingKey, G1_ENCODED_LEN, G2_ENCODED_LEN};
pub use proof::{Proof, PROOF_ENCODED_LEN};
pub use verifier::verify;

// re-exported so downstream crates speak the same curve types
pub use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
