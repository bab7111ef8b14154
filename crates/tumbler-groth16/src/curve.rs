//! affine group law and point validation on alt-bn128
//!
//! g1 is y^2 = x^3 + 3 over the base field Fq; g2 is the same shape over
//! the quadratic extension with the twisted constant. formulas are the
//! textbook affine ones with explicit field inversion.

use ark_bn254::{Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::{BigInteger, Field, PrimeField, Zero};

use crate::error::{Groth16Error, Result};

/// curve membership for g1: y^2 == x^3 + 3 (mod q)
pub fn is_on_curve_g1(x: &Fq, y: &Fq) -> bool {
    let b = <ark_bn254::g1::Config as SWCurveConfig>::COEFF_B;
    y.square() == x.square() * *x + b
}

/// curve membership for g2 over Fq2, with the twist constant b/xi
pub fn is_on_curve_g2(x: &Fq2, y: &Fq2) -> bool {
    let b = <ark_bn254::g2::Config as SWCurveConfig>::COEFF_B;
    y.square() == x.square() * *x + b
}

/// reject any g1 point that is neither the identity nor on the curve
///
/// g1 has cofactor 1, so on-curve already implies the r-order subgroup
pub fn validate_g1(p: &G1Affine) -> Result<()> {
    if p.infinity {
        return Ok(());
    }
    if !is_on_curve_g1(&p.x, &p.y) {
        return Err(Groth16Error::PointOffCurve);
    }
    Ok(())
}

/// reject any g2 point that is off-curve or outside the r-order subgroup
///
/// the g2 cofactor is nontrivial; a proof point in a small subgroup would
/// otherwise slip into the pairing
pub fn validate_g2(p: &G2Affine) -> Result<()> {
    if p.infinity {
        return Ok(());
    }
    if !is_on_curve_g2(&p.x, &p.y) {
        return Err(Groth16Error::PointOffCurve);
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Groth16Error::PointOffSubgroup);
    }
    Ok(())
}

/// -P = (x, -y); -O = O
pub fn negate_g1(p: &G1Affine) -> G1Affine {
    if p.infinity {
        return *p;
    }
    G1Affine::new_unchecked(p.x, -p.y)
}

/// 2P with lambda = 3x^2 / 2y; tangent at y = 0 goes through infinity
pub fn double_g1(p: &G1Affine) -> G1Affine {
    if p.infinity || p.y.is_zero() {
        return G1Affine::identity();
    }
    let Some(inv) = p.y.double().inverse() else {
        return G1Affine::identity();
    };
    let lambda = (p.x.square() + p.x.square().double()) * inv;
    let x3 = lambda.square() - p.x.double();
    let y3 = lambda * (p.x - x3) - p.y;
    G1Affine::new_unchecked(x3, y3)
}

/// P + Q with lambda = (y2 - y1) / (x2 - x1)
///
/// identity and the P == ±Q branches are handled explicitly before the
/// chord slope is formed, so the inversion denominator is never zero
pub fn add_g1(p: &G1Affine, q: &G1Affine) -> G1Affine {
    if p.infinity {
        return *q;
    }
    if q.infinity {
        return *p;
    }
    if p.x == q.x {
        if p.y == -q.y {
            return G1Affine::identity();
        }
        return double_g1(p);
    }
    let Some(inv) = (q.x - p.x).inverse() else {
        return G1Affine::identity();
    };
    let lambda = (q.y - p.y) * inv;
    let x3 = lambda.square() - p.x - q.x;
    let y3 = lambda * (p.x - x3) - p.y;
    G1Affine::new_unchecked(x3, y3)
}

/// k·P by double-and-add over the big-endian bits of k
///
/// k = 0 and P = O both yield the identity
pub fn scalar_mul_g1(p: &G1Affine, k: &Fr) -> G1Affine {
    if p.infinity || k.is_zero() {
        return G1Affine::identity();
    }
    let mut acc = G1Affine::identity();
    for bit in k.into_bigint().to_bits_be() {
        acc = double_g1(&acc);
        if bit {
            acc = add_g1(&acc, p);
        }
    }
    acc
}
