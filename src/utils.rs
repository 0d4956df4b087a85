// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Number-theoretic helpers shared across the crate: uniform sampling,
//! Jacobi symbols, and the extended Euclidean algorithm.

use crate::errors::{Error, Result};
use rand::{CryptoRng, RngCore};
use tracing::error;
use unknown_order::BigNumber;

/// Upper bound on draws in any rejection-sampling loop.
///
/// The pickiest sampler in this crate accepts a draw with probability one
/// half, so 256 draws push the failure probability below `2^-256`.
pub(crate) const MAX_REJECTION_DRAWS: usize = 256;

/// Draw candidates until one satisfies `keep`, giving up after
/// [`MAX_REJECTION_DRAWS`] attempts.
///
/// Every randomised search in this crate that cannot loop forever goes
/// through here: uniform bit strings, units modulo `n`, and non-residues.
/// `what` names the sought value in the failure log line.
pub(crate) fn sample_until<T>(
    mut draw: impl FnMut() -> Result<T>,
    mut keep: impl FnMut(&T) -> bool,
    what: &'static str,
) -> Result<T> {
    for _ in 0..MAX_REJECTION_DRAWS {
        let candidate = draw()?;
        if keep(&candidate) {
            return Ok(candidate);
        }
    }
    error!("Could not find {what} in {MAX_REJECTION_DRAWS} draws");
    Err(Error::RngFailure)
}

/// Sample a uniform integer of at most `bit_length` bits.
///
/// Draws `ceil(bit_length / 8)` bytes from the system RNG, interprets them
/// big-endian, masks the surplus high bits, and re-samples until the result
/// is non-zero. The returned value therefore has an effective bit length in
/// `[1, bit_length]`.
pub(crate) fn random_bits<R: RngCore + CryptoRng>(
    bit_length: usize,
    rng: &mut R,
) -> Result<BigNumber> {
    if bit_length == 0 {
        error!("Requested a random integer of zero bits");
        return Err(Error::BadParameter("bit length must be positive"));
    }
    let byte_length = (bit_length + 7) / 8;
    let surplus_bits = byte_length * 8 - bit_length;
    let mut buffer = vec![0u8; byte_length];
    sample_until(
        || {
            rng.try_fill_bytes(&mut buffer).map_err(|e| {
                error!("System RNG failed to produce {byte_length} bytes: {e}");
                Error::RngFailure
            })?;
            buffer[0] &= 0xff >> surplus_bits;
            Ok(BigNumber::from_slice(&buffer))
        },
        |candidate| candidate != &BigNumber::zero(),
        "a non-zero bit string",
    )
}

/// Generate a random element of the multiplicative group modulo `n`.
///
/// `n` is a product of two primes here, so a non-zero draw failing the gcd
/// test would actually expose a factor of `n`; the chance of that is
/// negligible and the draw is discarded all the same.
pub(crate) fn random_coprime<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Result<BigNumber> {
    sample_until(
        || Ok(BigNumber::from_rng(n, rng)),
        |candidate| candidate != &BigNumber::zero() && candidate.gcd(n) == BigNumber::one(),
        "an invertible element modulo n",
    )
}

/// Generate a random element of `Z/n` with Jacobi symbol `-1`.
pub(crate) fn random_nonresidue<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: &BigNumber,
) -> Result<BigNumber> {
    sample_until(
        || Ok(BigNumber::from_rng(n, rng)),
        |candidate| jacobi(candidate, n) == -1,
        "an element with Jacobi symbol -1",
    )
}

pub(crate) fn is_even(x: &BigNumber) -> bool {
    x % BigNumber::from(2u64) == BigNumber::zero()
}

/// Compute the Jacobi symbol `(a | n)` for odd positive `n`.
///
/// This is the binary algorithm: strip factors of two from `a` (flipping
/// the sign when `n = ±3 mod 8`), apply quadratic reciprocity, and reduce.
pub(crate) fn jacobi(a: &BigNumber, n: &BigNumber) -> i32 {
    debug_assert!(n > &BigNumber::zero() && !is_even(n));

    let zero = BigNumber::zero();
    let three = BigNumber::from(3u64);
    let four = BigNumber::from(4u64);
    let five = BigNumber::from(5u64);
    let eight = BigNumber::from(8u64);

    let mut a = a.nmod(n);
    let mut n = n.clone();
    let mut sign = 1i32;
    while a != zero {
        while is_even(&a) {
            a = a >> 1;
            let residue = &n % &eight;
            if residue == three || residue == five {
                sign = -sign;
            }
        }
        std::mem::swap(&mut a, &mut n);
        if &a % &four == three && &n % &four == three {
            sign = -sign;
        }
        a = a.nmod(&n);
    }
    if n == BigNumber::one() {
        sign
    } else {
        0
    }
}

/// Extended Euclidean algorithm.
///
/// Returns `(g, x, y)` with `g = gcd(a, b)` and `g = a*x + b*y`. Inputs
/// must be non-negative.
pub(crate) fn extended_gcd(a: &BigNumber, b: &BigNumber) -> (BigNumber, BigNumber, BigNumber) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigNumber::one(), BigNumber::zero());
    let (mut old_t, mut t) = (BigNumber::zero(), BigNumber::one());

    while r != BigNumber::zero() {
        let quotient = &old_r / &r;
        let next = &old_r - &(&quotient * &r);
        old_r = std::mem::replace(&mut r, next);
        let next = &old_s - &(&quotient * &s);
        old_s = std::mem::replace(&mut s, next);
        let next = &old_t - &(&quotient * &t);
        old_t = std::mem::replace(&mut t, next);
    }
    (old_r, old_s, old_t)
}

/// Compute `x!` as a big integer.
///
/// This is the `Δ = l!` scaling factor that keeps Lagrange coefficients
/// integral; `l` is at most `u16::MAX`.
pub(crate) fn factorial(x: u16) -> BigNumber {
    (2..=u64::from(x)).fold(BigNumber::one(), |acc, i| acc * BigNumber::from(i))
}

/// Compute `base^exponent mod modulus` where the exponent may be negative.
///
/// A negative exponent requires `base` to be invertible modulo `modulus`.
pub(crate) fn modpow_signed(
    base: &BigNumber,
    exponent: &BigNumber,
    modulus: &BigNumber,
) -> Result<BigNumber> {
    if exponent < &BigNumber::zero() {
        let inverse = base.invert(modulus).ok_or_else(|| {
            error!("Exponentiation base is not invertible modulo n");
            Error::InternalInvariantFailed
        })?;
        Ok(inverse.modpow(&-exponent.clone(), modulus))
    } else {
        Ok(base.modpow(exponent, modulus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;

    #[test]
    fn random_bits_stays_within_requested_length() {
        let mut rng = init_testing();
        for bit_length in [1, 7, 8, 9, 255, 256, 1024] {
            for _ in 0..32 {
                let value = random_bits(bit_length, &mut rng).unwrap();
                assert!(value.bit_length() <= bit_length);
                assert!(value > BigNumber::zero());
            }
        }
    }

    #[test]
    fn random_bits_rejects_zero_length() {
        let mut rng = init_testing();
        assert_eq!(
            random_bits(0, &mut rng),
            Err(Error::BadParameter("bit length must be positive"))
        );
    }

    #[test]
    fn consecutive_draws_differ() {
        let mut rng = init_testing();
        let first = random_bits(256, &mut rng).unwrap();
        let second = random_bits(256, &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn jacobi_matches_known_values() {
        let cases: [(u64, u64, i32); 7] = [
            (0, 7, 0),
            (1, 7, 1),
            (2, 7, 1),
            (3, 7, -1),
            (2, 15, 1),
            (7, 15, -1),
            (5, 15, 0),
        ];
        for (a, n, expected) in cases {
            assert_eq!(
                jacobi(&BigNumber::from(a), &BigNumber::from(n)),
                expected,
                "jacobi({a} | {n})"
            );
        }
    }

    #[test]
    fn jacobi_of_squares_is_one() {
        let mut rng = init_testing();
        let n = BigNumber::from(3u64 * 5 * 7 * 11 * 13 * 17 * 19 * 23);
        for _ in 0..16 {
            let r = random_coprime(&mut rng, &n).unwrap();
            let square = r.modpow(&BigNumber::from(2u64), &n);
            assert_eq!(jacobi(&square, &n), 1);
        }
    }

    #[test]
    fn rejection_sampling_gives_up_eventually() {
        let mut draws = 0usize;
        let result = sample_until(
            || {
                draws += 1;
                Ok(draws)
            },
            |_| false,
            "an unsatisfiable candidate",
        );
        assert_eq!(result, Err(Error::RngFailure));
        assert_eq!(draws, MAX_REJECTION_DRAWS);
    }

    #[test]
    fn extended_gcd_satisfies_bezout() {
        let a = BigNumber::from(4u64);
        let b = BigNumber::from(65537u64);
        let (g, x, y) = extended_gcd(&a, &b);
        assert_eq!(g, BigNumber::one());
        assert_eq!(&a * &x + &b * &y, BigNumber::one());

        let a = BigNumber::from(240u64);
        let b = BigNumber::from(46u64);
        let (g, x, y) = extended_gcd(&a, &b);
        assert_eq!(g, BigNumber::from(2u64));
        assert_eq!(&a * &x + &b * &y, g);
    }

    #[test]
    fn factorial_of_small_values() {
        assert_eq!(factorial(0), BigNumber::one());
        assert_eq!(factorial(1), BigNumber::one());
        assert_eq!(factorial(5), BigNumber::from(120u64));
        assert_eq!(factorial(10), BigNumber::from(3_628_800u64));
    }

    #[test]
    fn modpow_signed_inverts_negative_exponents() {
        let n = BigNumber::from(101u64);
        let base = BigNumber::from(7u64);
        let exponent = BigNumber::from(13u64);
        let forward = modpow_signed(&base, &exponent, &n).unwrap();
        let backward = modpow_signed(&base, &-exponent, &n).unwrap();
        assert_eq!((&forward * &backward).nmod(&n), BigNumber::one());
    }
}

////////////////////////////
// Test Utility Functions //
////////////////////////////

#[cfg(test)]
pub(crate) mod testing {
    use crate::enable_wipe_on_free;
    use rand::{
        rngs::{OsRng, StdRng},
        Rng, SeedableRng,
    };
    use tracing_subscriber::{
        filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    /// Initialize any fields necessary for our tests. This should be called
    /// at the top of all our tests. This function is idempotent.
    ///
    /// This will print the rng seed to stderr so that if a test fails, the
    /// failing seed can be recovered and used for debugging.
    pub(crate) fn init_testing() -> StdRng {
        enable_wipe_on_free();
        let mut seeder = OsRng;
        let seed = seeder.gen();
        eprintln!(
            "To re-run test with the same randomness, use init_testing_with_seed() with the following seed:"
        );
        eprintln!("\t{seed:?}");
        StdRng::from_seed(seed)
    }

    /// A seeded version of [`init_testing`]. This function can be used when
    /// a test fails unexpectedly, and you want to reproduce the run using a
    /// specific RNG seed.
    ///
    /// **Additionally, turns on logging by default.**
    ///
    /// This function should only be called when debugging; it turns on
    /// logging for all tests, which is confusing for tests that purposely
    /// feed bad input to functions and trigger error events.
    #[allow(unused)]
    pub(crate) fn init_testing_with_seed(seed: [u8; 32]) -> StdRng {
        let logging_level = EnvFilter::from_default_env()
            .max_level_hint()
            .unwrap()
            .into_level()
            .unwrap();

        // Only capture logging events from this crate.
        let targets = Targets::new().with_target("tss_rsa", logging_level);
        let stdout_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_filter(targets);

        // It's okay if this fails. It just means logging has already been
        // set up for this thread.
        let _ = tracing_subscriber::registry().with(stdout_layer).try_init();

        StdRng::from_seed(seed)
    }
}
