//! Cryptographic Primitives
//!
//! This module provides the building blocks for threshold attestation:
//!
//! - **field**: Modular arithmetic over GF(prime)
//! - **helpers**: Lagrange coefficients over the field
//! - **shamir**: Secret splitting and reconstruction

pub mod field;
pub mod helpers;
pub mod shamir;

pub use field::{is_prime, PrimeField};
pub use shamir::{reconstruct_secret, split_secret, Share, SharingParams};
