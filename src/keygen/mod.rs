// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Types and functions related to shared key generation.[^cite]
//!
//! A trusted dealer produces a standard RSA keypair and splits the private
//! exponent into `l` shares with threshold `k`:
//! - The primes `p = 2p' + 1` and `q = 2q' + 1` are safe, so the sharing
//!   modulus `m = p'q'` is a product of two large primes.
//! - The private exponent `d = e⁻¹ mod m` becomes the constant term of a
//!   random polynomial `f` of degree `k - 1` over `Z/m`; participant `i`
//!   receives `s_i = Δ⁻¹·f(i) mod m` where `Δ = l!`.
//! - A verification key is published alongside the public key: a random
//!   square `V mod n`, the values `V_i = V^{s_i} mod n`, and an element `U`
//!   with Jacobi symbol `-1` used to normalise documents before signing.
//!
//! Any `k` of the resulting [`KeyShare`]s can sign; fewer than `k` reveal
//! nothing useful about `d`.
//!
//! [^cite]: Victor Shoup. Practical Threshold Signatures. Eurocrypt 2000.
//! [PDF](http://www.iacr.org/archive/eurocrypt2000/1807/18070209-new.pdf).
//! Section 2.

mod keyshare;
mod meta;

pub use keyshare::KeyShare;
pub use meta::{KeyMeta, VerificationKey};

use crate::{
    errors::{Error, Result},
    polynomial::Polynomial,
    prime_gen,
    utils::{factorial, random_coprime, random_nonresidue},
};
use rand::{CryptoRng, RngCore};
use std::fmt::Debug;
use tracing::error;
use unknown_order::BigNumber;
use zeroize::Zeroize;

/// Minimum supported key size in bits.
pub const MIN_BIT_SIZE: usize = 512;

/// Maximum supported key size in bits.
pub const MAX_BIT_SIZE: usize = 4096;

/// Fermat's fourth number, the default RSA public exponent.
pub const F4: u64 = 65537;

/// Fixed values injected into key generation.
///
/// Every field that is left as `None` is sampled honestly. Supplying values
/// makes key material reproducible and is only intended for tests and
/// cross-implementation vectors; never use overrides in production.
#[derive(Clone, Default)]
pub struct KeygenOverrides {
    /// First safe prime. Must have exactly `⌈(bit_size + 1) / 2⌉` bits, and
    /// both `p` and `(p - 1) / 2` must be prime.
    pub p: Option<BigNumber>,
    /// Second safe prime. Must have exactly
    /// `bit_size - ⌈(bit_size + 1) / 2⌉ - 1` bits, with the same primality
    /// requirements as `p`.
    pub q: Option<BigNumber>,
    /// Public exponent. Used only when prime and greater than the share
    /// count; otherwise key generation silently falls back to
    /// [`F4`]. Callers that need to detect the fallback can compare
    /// [`KeyMeta::public_exponent`] afterwards.
    pub e: Option<BigNumber>,
    /// Base of the verification value `V = r² mod n`. Must be coprime with
    /// the modulus.
    pub r: Option<BigNumber>,
    /// Jacobi-normalisation value `U`. Taken as supplied; the honest
    /// sampling path guarantees `(U | n) = -1`.
    pub u: Option<BigNumber>,
    /// Use the deterministic polynomial (coefficient `i` for the term of
    /// degree `i`) instead of random coefficients.
    pub fixed_coefficients: bool,
}

impl Debug for KeygenOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeygenOverrides")
            .field("p", &self.p.as_ref().map(|_| "[redacted]"))
            .field("q", &self.q.as_ref().map(|_| "[redacted]"))
            .field("e", &self.e)
            .field("r", &self.r)
            .field("u", &self.u)
            .field("fixed_coefficients", &self.fixed_coefficients)
            .finish()
    }
}

/// Generate a shared RSA key.
///
/// Produces the public [`KeyMeta`] and one [`KeyShare`] per participant.
/// `threshold` shares are needed to sign; the parameters must satisfy
/// `1 < threshold <= share_count` and
/// `threshold >= share_count / 2 + 1`.
///
/// Key generation is all-or-nothing: on any failure nothing is returned
/// and partially derived secrets are wiped.
pub fn generate_key<R: RngCore + CryptoRng>(
    bit_size: usize,
    threshold: u16,
    share_count: u16,
    overrides: Option<&KeygenOverrides>,
    rng: &mut R,
) -> Result<(KeyMeta, Vec<KeyShare>)> {
    if !(MIN_BIT_SIZE..=MAX_BIT_SIZE).contains(&bit_size) {
        error!("Key size must be in [{MIN_BIT_SIZE}, {MAX_BIT_SIZE}], got {bit_size}");
        return Err(Error::BadParameter("bit size out of range"));
    }
    if share_count <= 1 {
        error!("Share count must be greater than 1, got {share_count}");
        return Err(Error::BadParameter("share count must be greater than 1"));
    }
    if threshold == 0 {
        error!("Threshold must be greater than 0");
        return Err(Error::BadParameter("threshold must be greater than 0"));
    }
    if threshold < share_count / 2 + 1 || threshold > share_count {
        error!(
            "Threshold must be in [{}, {share_count}], got {threshold}",
            share_count / 2 + 1
        );
        return Err(Error::BadParameter("threshold out of range"));
    }

    let p_size = (bit_size + 1) / 2;
    let q_size = bit_size - p_size - 1;

    let (mut p, mut p_prime) = match overrides.and_then(|o| o.p.as_ref()) {
        Some(p) => checked_safe_prime_override(p, p_size, rng)?,
        None => prime_gen::generate_safe_primes(p_size, rng)?,
    };
    let (mut q, mut q_prime) = match overrides.and_then(|o| o.q.as_ref()) {
        Some(q) => checked_safe_prime_override(q, q_size, rng)?,
        None => prime_gen::generate_safe_primes(q_size, rng)?,
    };

    let n = &p * &q;
    let mut m = &p_prime * &q_prime;

    let e = match overrides.and_then(|o| o.e.as_ref()) {
        Some(e)
            if prime_gen::is_probable_prime(e, rng)
                && e > &BigNumber::from(u64::from(share_count)) =>
        {
            e.clone()
        }
        _ => BigNumber::from(F4),
    };

    let mut d = e.invert(&m).ok_or_else(|| {
        error!("Public exponent shares a factor with p'q'");
        Error::BadParameter("public exponent is not invertible modulo p'q'")
    })?;

    let r = match overrides.and_then(|o| o.r.as_ref()) {
        Some(r) => {
            if r.gcd(&n) != BigNumber::one() {
                error!("Supplied r shares a factor with the modulus");
                return Err(Error::BadParameter("r must be coprime with the modulus"));
            }
            r.clone()
        }
        None => random_coprime(rng, &n)?,
    };
    let v = r.modpow(&BigNumber::from(2u64), &n);

    let u = match overrides.and_then(|o| o.u.as_ref()) {
        Some(u) => u.clone(),
        None => random_nonresidue(rng, &n)?,
    };

    let mut delta_inv = factorial(share_count).invert(&m).ok_or_else(|| {
        error!("l! is not invertible modulo p'q'; the primes are too small");
        Error::InternalInvariantFailed
    })?;

    let degree = usize::from(threshold) - 1;
    let polynomial = if overrides.is_some_and(|o| o.fixed_coefficients) {
        Polynomial::fixed(degree, &d, &m)?
    } else {
        Polynomial::random(degree, &d, &m, rng)?
    };

    let mut verification_key = VerificationKey::new(v.clone(), u, share_count);
    let mut shares = Vec::with_capacity(usize::from(share_count));
    for i in 1..=share_count {
        let mut evaluation = polynomial.eval(&BigNumber::from(u64::from(i)));
        let secret = (&evaluation * &delta_inv).nmod(&m);
        evaluation.zeroize();
        verification_key.push_share_key(v.modpow(&secret, &n));
        shares.push(KeyShare::new(i, secret));
    }

    p.zeroize();
    q.zeroize();
    p_prime.zeroize();
    q_prime.zeroize();
    m.zeroize();
    d.zeroize();
    delta_inv.zeroize();

    let meta = KeyMeta::new(n, e, threshold, share_count, verification_key);
    Ok((meta, shares))
}

/// Validate a caller-supplied safe prime and return it with its cofactor
/// `(p - 1) / 2`.
fn checked_safe_prime_override<R: RngCore + CryptoRng>(
    prime: &BigNumber,
    expected_bits: usize,
    rng: &mut R,
) -> Result<(BigNumber, BigNumber)> {
    if prime.bit_length() != expected_bits {
        error!(
            "Prime override has {} bits, expected {expected_bits}",
            prime.bit_length()
        );
        return Err(Error::BadParameter("prime override has the wrong bit length"));
    }
    let cofactor = (prime - &BigNumber::one()) >> 1;
    if !prime_gen::is_probable_prime(prime, rng) || !prime_gen::is_probable_prime(&cofactor, rng) {
        error!("Prime override is not a safe prime");
        return Err(Error::BadParameter("prime override must be a safe prime"));
    }
    Ok((prime.clone(), cofactor))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A fixed 512-bit key, matching the vectors recorded by the original
    //! implementation of this scheme.

    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    pub(crate) const BIT_SIZE: usize = 512;
    pub(crate) const THRESHOLD: u16 = 3;
    pub(crate) const SHARE_COUNT: u16 = 5;

    pub(crate) const P_B64: &str = "132TWiSEqNNnfiF5AZjS2R8SwUszMGnHSKTYAtWckuc=";
    pub(crate) const Q_B64: &str = "f8PooDmAlOUFf3BdAxPCOy8p5ArfLHs6ODFWTFnpUxM=";
    pub(crate) const R_B64: &str =
        "UfF0MWqXf+K4GjmcWhxdK3CH/XVsDxm8r+CqBenL7TfdWNAD4rpUMIHzhqb0WV6KAAJfGEBlHyj1JH2rr9LiUA==";
    pub(crate) const U_B64: &str =
        "CpJe+VzsAI3FcPioeMXklkxFFb+M9MaN1VzuScOs+7bwvczarYABZhyjPFC8McXCFAJIvaKTZwTlpylwJPumZw==";

    pub(crate) fn decode(b64: &str) -> BigNumber {
        BigNumber::from_slice(STANDARD.decode(b64).unwrap())
    }

    pub(crate) fn overrides() -> KeygenOverrides {
        KeygenOverrides {
            p: Some(decode(P_B64)),
            q: Some(decode(Q_B64)),
            r: Some(decode(R_B64)),
            u: Some(decode(U_B64)),
            e: None,
            fixed_coefficients: true,
        }
    }

    pub(crate) fn fixed_key<R: RngCore + CryptoRng>(rng: &mut R) -> (KeyMeta, Vec<KeyShare>) {
        generate_key(BIT_SIZE, THRESHOLD, SHARE_COUNT, Some(&overrides()), rng)
            .expect("fixture key generation cannot fail")
    }
}
