//! Shamir Secret Sharing over GF(prime)
//!
//! ## Overview
//!
//! For a k-of-n split of secret `s`:
//!
//! 1. Build f(x) = s + c_1·x + ... + c_{k-1}·x^{k-1} with each c_i drawn
//!    uniformly from [1, prime-1]
//! 2. Share i is (i, f(i) mod prime) for i = 1..n
//! 3. Any k shares recover s = f(0) by Lagrange interpolation at x = 0
//!
//! Fewer than k shares reveal nothing about `s`. All evaluation and
//! interpolation is reduced modulo the prime at every step.

use crate::crypto::field::PrimeField;
use crate::crypto::helpers::lagrange_coefficient_at_zero;
use crate::error::{VerificationError, VerificationResult};
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single share: the polynomial evaluated at `index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Share {
    /// Share index (1..=n, never 0)
    pub index: u32,
    /// f(index) mod prime
    pub value: u64,
}

/// n/k/prime for one milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingParams {
    pub num_shares: u32,
    pub threshold: u32,
    pub prime: u64,
}

impl SharingParams {
    pub fn new(num_shares: u32, threshold: u32, prime: u64) -> Self {
        Self {
            num_shares,
            threshold,
            prime,
        }
    }

    /// Validate the parameters and return the field they define.
    ///
    /// Requires `1 <= threshold <= num_shares` and a prime modulus larger
    /// than `num_shares`, so every share index is a distinct nonzero field
    /// element.
    pub fn field(&self) -> VerificationResult<PrimeField> {
        if self.threshold == 0 {
            return Err(VerificationError::invalid("threshold must be at least 1"));
        }
        if self.threshold > self.num_shares {
            return Err(VerificationError::invalid(format!(
                "threshold {} exceeds number of shares {}",
                self.threshold, self.num_shares
            )));
        }
        let field = PrimeField::new(self.prime)?;
        if self.prime <= self.num_shares as u64 {
            return Err(VerificationError::invalid(format!(
                "prime {} must exceed number of shares {}",
                self.prime, self.num_shares
            )));
        }
        Ok(field)
    }
}

/// Split `secret` into `num_shares` shares, any `threshold` of which recover it.
///
/// The RNG must be cryptographically strong; pass a seeded
/// `ChaCha20Rng` for reproducible output.
pub fn split_secret<R: RngCore + CryptoRng>(
    secret: u64,
    params: &SharingParams,
    rng: &mut R,
) -> VerificationResult<Vec<Share>> {
    let field = params.field()?;
    if secret >= field.prime() {
        return Err(VerificationError::invalid(format!(
            "secret must be below prime {}",
            field.prime()
        )));
    }

    let coefficients = random_polynomial(&field, secret, params.threshold, rng);

    let shares = (1..=params.num_shares)
        .map(|index| Share {
            index,
            value: evaluate_polynomial(&field, &coefficients, index as u64),
        })
        .collect();

    Ok(shares)
}

/// [secret, c_1, ..., c_{k-1}] with every c_i in [1, prime-1]
fn random_polynomial<R: RngCore + CryptoRng>(
    field: &PrimeField,
    secret: u64,
    threshold: u32,
    rng: &mut R,
) -> Vec<u64> {
    let mut coefficients = Vec::with_capacity(threshold as usize);
    coefficients.push(secret);
    for _ in 1..threshold {
        coefficients.push(rng.gen_range(1..field.prime()));
    }
    coefficients
}

/// Evaluate f(x) = c_0 + c_1·x + ... with Horner's method, reducing every step.
pub fn evaluate_polynomial(field: &PrimeField, coefficients: &[u64], x: u64) -> u64 {
    let x = field.reduce(x);
    coefficients
        .iter()
        .rev()
        .fold(0u64, |acc, &c| field.add(field.mul(acc, x), c))
}

/// Recover the secret from exactly `threshold` shares.
///
/// Indices must be pairwise distinct and within `1..=num_shares`. No
/// consistency check is made: shares from different polynomials silently
/// yield a wrong value.
pub fn reconstruct_secret(shares: &[Share], params: &SharingParams) -> VerificationResult<u64> {
    let field = params.field()?;

    if shares.len() != params.threshold as usize {
        return Err(VerificationError::malformed(format!(
            "expected exactly {} shares, got {}",
            params.threshold,
            shares.len()
        )));
    }

    let mut seen = BTreeSet::new();
    for share in shares {
        if share.index == 0 || share.index > params.num_shares {
            return Err(VerificationError::malformed(format!(
                "share index {} outside 1..={}",
                share.index, params.num_shares
            )));
        }
        if !seen.insert(share.index) {
            return Err(VerificationError::malformed(format!(
                "duplicate share index {}",
                share.index
            )));
        }
        if share.value >= field.prime() {
            return Err(VerificationError::malformed(format!(
                "share {} value is not a field element",
                share.index
            )));
        }
    }

    let indices: Vec<u32> = shares.iter().map(|s| s.index).collect();

    // s = Σ λ_i(0) · y_i
    let mut secret = 0u64;
    for share in shares {
        let lambda = lagrange_coefficient_at_zero(&field, share.index, &indices)?;
        secret = field.add(secret, field.mul(lambda, share.value));
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_evaluate_polynomial_reduces() {
        // f(x) = 15 + 10x + 3x^2 over GF(17)
        let field = PrimeField::new(17).unwrap();
        let coeffs = vec![15, 10, 3];

        assert_eq!(evaluate_polynomial(&field, &coeffs, 0), 15);
        // 15 + 10 + 3 = 28 ≡ 11
        assert_eq!(evaluate_polynomial(&field, &coeffs, 1), 11);
        // 15 + 20 + 12 = 47 ≡ 13
        assert_eq!(evaluate_polynomial(&field, &coeffs, 2), 13);
    }

    #[test]
    fn test_split_is_deterministic_with_seed() {
        let params = SharingParams::new(5, 3, 101);

        let a = split_secret(42, &params, &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        let b = split_secret(42, &params, &mut ChaCha20Rng::seed_from_u64(7)).unwrap();

        assert_eq!(a, b);
        let indices: Vec<u32> = a.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert!(a.iter().all(|s| s.value < 101));
    }

    #[test]
    fn test_threshold_one_gives_constant_shares() {
        let params = SharingParams::new(4, 1, 17);
        let shares = split_secret(9, &params, &mut ChaCha20Rng::seed_from_u64(1)).unwrap();
        assert!(shares.iter().all(|s| s.value == 9));
        assert_eq!(reconstruct_secret(&shares[2..3], &params).unwrap(), 9);
    }

    #[test]
    fn test_invalid_params() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        // k > n
        let err = split_secret(1, &SharingParams::new(3, 4, 17), &mut rng).unwrap_err();
        assert!(matches!(err, VerificationError::InvalidParameters { .. }));

        // k = 0
        assert!(split_secret(1, &SharingParams::new(3, 0, 17), &mut rng).is_err());

        // composite modulus
        assert!(split_secret(1, &SharingParams::new(3, 2, 15), &mut rng).is_err());

        // prime not larger than n
        assert!(split_secret(1, &SharingParams::new(7, 2, 7), &mut rng).is_err());

        // secret outside the field (the 15-over-GF(7) setup)
        assert!(split_secret(15, &SharingParams::new(3, 2, 7), &mut rng).is_err());
    }

    #[test]
    fn test_reconstruct_rejects_malformed_sets() {
        let params = SharingParams::new(3, 2, 17);
        let shares = split_secret(15, &params, &mut ChaCha20Rng::seed_from_u64(3)).unwrap();

        // wrong count
        let err = reconstruct_secret(&shares, &params).unwrap_err();
        assert!(matches!(err, VerificationError::ReconstructionError { .. }));
        assert!(reconstruct_secret(&shares[..1], &params).is_err());

        // duplicate index
        assert!(reconstruct_secret(&[shares[0], shares[0]], &params).is_err());

        // out of range index
        let stray = Share { index: 4, value: 1 };
        assert!(reconstruct_secret(&[shares[0], stray], &params).is_err());
        let zero = Share { index: 0, value: 15 };
        assert!(reconstruct_secret(&[zero, shares[1]], &params).is_err());

        // value outside the field
        let big = Share { index: 2, value: 17 };
        assert!(reconstruct_secret(&[shares[0], big], &params).is_err());
    }

    #[test]
    fn test_reconstruct_known_line() {
        // f(x) = 15 + 4x over GF(17): f(1) = 2, f(3) = 27 ≡ 10
        let params = SharingParams::new(3, 2, 17);
        let shares = [Share { index: 1, value: 2 }, Share { index: 3, value: 10 }];
        assert_eq!(reconstruct_secret(&shares, &params).unwrap(), 15);
    }
}
