//! Cryptographic Helper Functions
//!
//! Lagrange interpolation coefficients over a prime field, shared by
//! secret reconstruction and its tests.

use crate::crypto::field::PrimeField;
use crate::error::{VerificationError, VerificationResult};

// ============================================================================
// Lagrange Interpolation
// ============================================================================

/// Compute Lagrange coefficient for party_index at target_x.
///
/// λ_i(x) = Π_{j≠i} (x - j) / (i - j)
///
/// Numerator and denominator are accumulated as field elements, so the
/// result is exact for any number of parties.
///
/// # Arguments
/// * `field` - The field the shares live in
/// * `party_index` - The index i for which to compute the coefficient
/// * `all_indices` - All party indices participating in interpolation
/// * `target_x` - The x-coordinate at which to evaluate (0 for secret recovery)
pub fn lagrange_coefficient_at(
    field: &PrimeField,
    party_index: u32,
    all_indices: &[u32],
    target_x: u64,
) -> VerificationResult<u64> {
    let mut numerator = 1u64;
    let mut denominator = 1u64;

    let i = field.reduce(party_index as u64);
    let x = field.reduce(target_x);

    for &other_index in all_indices {
        if other_index == party_index {
            continue;
        }

        let j = field.reduce(other_index as u64);

        // numerator *= (x - j)
        numerator = field.mul(numerator, field.sub(x, j));

        // denominator *= (i - j)
        denominator = field.mul(denominator, field.sub(i, j));
    }

    let denom_inv = field.inv(denominator).ok_or_else(|| {
        VerificationError::malformed("Lagrange denominator is zero - duplicate indices?")
    })?;

    Ok(field.mul(numerator, denom_inv))
}

/// Compute Lagrange coefficient at x=0 (for secret reconstruction).
///
/// λ_i(0) = Π_{j≠i} (-j) / (i - j) = Π_{j≠i} j / (j - i)
pub fn lagrange_coefficient_at_zero(
    field: &PrimeField,
    party_index: u32,
    all_indices: &[u32],
) -> VerificationResult<u64> {
    lagrange_coefficient_at(field, party_index, all_indices, 0)
}
