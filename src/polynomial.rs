// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Secret-sharing polynomials over `Z/m`.
//!
//! The constant term carries the shared secret (the RSA private exponent
//! scaled by the dealer), so the whole coefficient vector is treated as key
//! material and wiped on drop.

use crate::{
    errors::{Error, Result},
    utils::random_bits,
};
use rand::{CryptoRng, RngCore};
use tracing::error;
use unknown_order::BigNumber;
use zeroize::ZeroizeOnDrop;

/// A polynomial with `degree + 1` coefficients in `Z/m`, lowest degree
/// first.
#[derive(Clone, ZeroizeOnDrop)]
pub(crate) struct Polynomial {
    coefficients: Vec<BigNumber>,
}

impl std::fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Polynomial")
            .field("degree", &self.degree())
            .field("coefficients", &"[redacted]")
            .finish()
    }
}

impl Polynomial {
    /// Build a polynomial of the given degree with `f(0) = constant` and
    /// the remaining coefficients sampled uniformly from `Z/m`.
    ///
    /// Coefficients are drawn as `bit_length(m) - 1` random bits and
    /// reduced mod `m`.
    pub(crate) fn random<R: RngCore + CryptoRng>(
        degree: usize,
        constant: &BigNumber,
        modulus: &BigNumber,
        rng: &mut R,
    ) -> Result<Self> {
        Self::check_modulus(modulus)?;
        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(constant.clone());
        for _ in 0..degree {
            let coefficient = random_bits(modulus.bit_length() - 1, rng)?.nmod(modulus);
            coefficients.push(coefficient);
        }
        Ok(Self { coefficients })
    }

    /// Build a polynomial of the given degree with `f(0) = constant` and
    /// coefficient `i mod m` for the term of degree `i`.
    ///
    /// Only useful for reproducible test vectors; an adversary who knows
    /// the coefficients can recover the secret from a single share.
    pub(crate) fn fixed(
        degree: usize,
        constant: &BigNumber,
        modulus: &BigNumber,
    ) -> Result<Self> {
        Self::check_modulus(modulus)?;
        let mut coefficients = Vec::with_capacity(degree + 1);
        coefficients.push(constant.clone());
        for i in 1..=degree {
            coefficients.push(BigNumber::from(i as u64).nmod(modulus));
        }
        Ok(Self { coefficients })
    }

    fn check_modulus(modulus: &BigNumber) -> Result<()> {
        if modulus <= &BigNumber::zero() {
            error!("Polynomial modulus must be positive");
            return Err(Error::BadParameter("polynomial modulus must be positive"));
        }
        Ok(())
    }

    pub(crate) fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate the polynomial at `x` with Horner's method, over the
    /// integers. The caller reduces the result into whatever ring it needs.
    pub(crate) fn eval(&self, x: &BigNumber) -> BigNumber {
        self.coefficients
            .iter()
            .rev()
            .fold(BigNumber::zero(), |acc, coefficient| acc * x + coefficient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    const TEST_DEGREE: usize = 3;

    #[test]
    fn random_polynomial_has_requested_shape() {
        let mut rng = init_testing();
        let constant = BigNumber::from(10u64);
        let modulus = BigNumber::from(1024u64);
        let poly = Polynomial::random(TEST_DEGREE, &constant, &modulus, &mut rng).unwrap();

        assert_eq!(poly.degree(), TEST_DEGREE);
        assert_eq!(poly.eval(&BigNumber::zero()), constant);
        for coefficient in &poly.coefficients[1..] {
            assert!(coefficient < &modulus);
        }
    }

    #[test]
    fn nonpositive_modulus_is_rejected() {
        let mut rng = init_testing();
        let constant = BigNumber::from(10u64);
        let result = Polynomial::random(TEST_DEGREE, &constant, &BigNumber::zero(), &mut rng);
        assert!(matches!(result, Err(Error::BadParameter(_))));
    }

    #[test]
    fn horner_evaluation_matches_hand_computation() {
        // 7x^3 + 5x^2 + 9x + 1 at x = 10.
        let poly = Polynomial {
            coefficients: vec![
                BigNumber::one(),
                BigNumber::from(9u64),
                BigNumber::from(5u64),
                BigNumber::from(7u64),
            ],
        };
        assert_eq!(poly.eval(&BigNumber::from(10u64)), BigNumber::from(7591u64));
    }

    #[test]
    fn fixed_polynomial_is_deterministic() {
        let constant = BigNumber::from(42u64);
        let modulus = BigNumber::from(1024u64);
        let a = Polynomial::fixed(TEST_DEGREE, &constant, &modulus).unwrap();
        let b = Polynomial::fixed(TEST_DEGREE, &constant, &modulus).unwrap();
        for x in 0..8u64 {
            let x = BigNumber::from(x);
            assert_eq!(a.eval(&x), b.eval(&x));
        }
        // 1*x + 2*x^2 + 3*x^3 on top of the constant term.
        assert_eq!(
            a.eval(&BigNumber::from(2u64)),
            BigNumber::from(42u64 + 2 + 8 + 24)
        );
    }
}
