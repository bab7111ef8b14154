//! error types for proof verification

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Groth16Error {
    #[error("point is not on the curve")]
    PointOffCurve,

    #[error("g2 point is not in the r-order subgroup")]
    PointOffSubgroup,

    #[error("coordinate is not a canonical base-field element")]
    NonCanonicalField,

    #[error("malformed encoding: expected {expected} bytes, got {got}")]
    MalformedEncoding { expected: usize, got: usize },

    #[error("public input count {got} does not match circuit arity {expected}")]
    InputLengthMismatch { expected: usize, got: usize },

    #[error("verification key carries no input-commitment points")]
    EmptyVerifyingKey,
}

pub type Result<T> = core::result::Result<T, Groth16Error>;
