//! Prime Field Arithmetic
//!
//! Arithmetic over GF(p) for a `u64` prime `p`. Every operation returns a
//! value already reduced into `[0, p)`; products go through `u128` so no
//! intermediate ever wraps.

use crate::error::{VerificationError, VerificationResult};

/// Deterministic Miller-Rabin witnesses, exact for every `u64`.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// A prime field GF(prime)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeField {
    prime: u64,
}

impl PrimeField {
    /// Build a field, rejecting moduli that are not prime.
    pub fn new(prime: u64) -> VerificationResult<Self> {
        if !is_prime(prime) {
            return Err(VerificationError::invalid(format!(
                "modulus {} is not prime",
                prime
            )));
        }
        Ok(Self { prime })
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    pub fn reduce(&self, value: u64) -> u64 {
        value % self.prime
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        ((a as u128 + b as u128) % self.prime as u128) as u64
    }

    pub fn sub(&self, a: u64, b: u64) -> u64 {
        let a = self.reduce(a);
        let b = self.reduce(b);
        if a >= b {
            a - b
        } else {
            self.prime - (b - a)
        }
    }

    pub fn neg(&self, a: u64) -> u64 {
        self.sub(0, a)
    }

    pub fn mul(&self, a: u64, b: u64) -> u64 {
        mul_mod(a, b, self.prime)
    }

    /// Square-and-multiply exponentiation
    pub fn pow(&self, base: u64, exp: u64) -> u64 {
        pow_mod(base, exp, self.prime)
    }

    /// Multiplicative inverse via Fermat's little theorem: a^(p-2).
    ///
    /// Returns `None` for zero (mod p).
    pub fn inv(&self, a: u64) -> Option<u64> {
        let a = self.reduce(a);
        if a == 0 {
            return None;
        }
        Some(self.pow(a, self.prime - 2))
    }
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1u64;
    let mut base = base % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Deterministic primality test for `u64`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &MILLER_RABIN_BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    // n - 1 = d * 2^s with d odd
    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &MILLER_RABIN_BASES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
