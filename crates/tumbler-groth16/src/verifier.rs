//! the groth16 pairing check
//!
//! accepts iff every point is well formed and
//!
//! ```text
//! e(A, B) == e(alpha, beta) · e(vk_x, gamma) · e(C, delta)
//! ```
//!
//! where vk_x folds the public inputs into the key's input-commitment
//! points. evaluated as a single product with A negated, checked against
//! the target-group identity. no partial credit: any mismatch rejects.

use ark_bn254::{Bn254, Fr};
use ark_ec::pairing::Pairing;
use ark_ff::Zero;

use crate::curve::{add_g1, negate_g1, scalar_mul_g1, validate_g1, validate_g2};
use crate::error::{Groth16Error, Result};
use crate::key::VerifyingKey;
use crate::proof::Proof;

/// verify a proof against a key and its public inputs
///
/// pure: identical arguments always yield the same boolean, and a failed
/// verification never touches any state. `Err` means the inputs were
/// structurally unusable (wrong arity, malformed point); `Ok(false)`
/// means the pairing equation did not hold.
pub fn verify(vk: &VerifyingKey, proof: &Proof, public_inputs: &[Fr]) -> Result<bool> {
    if vk.ic.is_empty() {
        return Err(Groth16Error::EmptyVerifyingKey);
    }
    if public_inputs.len() != vk.ic.len() - 1 {
        return Err(Groth16Error::InputLengthMismatch {
            expected: vk.ic.len() - 1,
            got: public_inputs.len(),
        });
    }

    // reject off-curve material before any group arithmetic
    validate_g1(&proof.a)?;
    validate_g2(&proof.b)?;
    validate_g1(&proof.c)?;
    validate_g1(&vk.alpha_g1)?;
    validate_g2(&vk.beta_g2)?;
    validate_g2(&vk.gamma_g2)?;
    validate_g2(&vk.delta_g2)?;
    for point in &vk.ic {
        validate_g1(point)?;
    }

    // vk_x = ic[0] + sum_i inputs[i] * ic[i+1]
    let mut vk_x = vk.ic[0];
    for (input, point) in public_inputs.iter().zip(&vk.ic[1..]) {
        vk_x = add_g1(&vk_x, &scalar_mul_g1(point, input));
    }

    let product = Bn254::multi_pairing(
        [negate_g1(&proof.a), vk.alpha_g1, vk_x, proof.c],
        [proof.b, vk.beta_g2, vk.gamma_g2, vk.delta_g2],
    );

    Ok(product.is_zero())
}
