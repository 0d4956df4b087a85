// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Combination of signature shares into an ordinary RSA signature.
//!
//! Given `k` partial signatures `x_i = x^{2 s_i}`, interpolation in the
//! exponent with the integer Lagrange coefficients `λ_i = Δ·ℓ_i(0)` yields
//! `w = Π x_i^{2 λ_i} = x^{4d} mod n`. Because `gcd(4, e) = 1` there are
//! integers `a, b` with `4a + be = 1`, and `w^a·x^b = x^d` is the RSA
//! signature. No secret material is involved; anyone holding enough shares
//! can combine them.

use crate::{
    errors::{Error, Result},
    keygen::KeyMeta,
    sign::{normalize_document, SignatureShare},
    utils::{extended_gcd, factorial, modpow_signed},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use unknown_order::BigNumber;

/// A standard RSA signature, zero-padded on the left to the byte length of
/// the modulus.
///
/// The bytes verify under the ordinary RSA public key `(n, e)` carried by
/// the [`KeyMeta`] that produced the shares; no threshold-aware verifier is
/// needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// The signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the signature and return its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Combine signature shares into an RSA signature over the prepared
/// document.
///
/// At least [`KeyMeta::threshold`] shares are required; exactly that many
/// are used, taken in the order supplied. The shares are not re-verified
/// here; callers that accept shares from untrusted participants should run
/// [`SignatureShare::verify`] first and drop any share that fails.
pub fn join(
    shares: &[SignatureShare],
    document: &[u8],
    meta: &KeyMeta,
) -> Result<Signature> {
    let need = usize::from(meta.threshold());
    if shares.len() < need {
        error!(
            "Cannot combine {} signature shares; the threshold is {need}",
            shares.len()
        );
        return Err(Error::InsufficientShares {
            got: shares.len(),
            need,
        });
    }

    let n = meta.modulus();
    let (x, corrected) = normalize_document(document, meta)?;

    let selected = &shares[..need];
    let points: Vec<u16> = selected.iter().map(|s| s.index()).collect();
    let delta = factorial(meta.share_count());

    let mut w = BigNumber::one();
    for share in selected {
        let lambda = lagrange_coefficient(&points, share.index(), &delta);
        let exponent = &lambda * &BigNumber::from(2u64);
        w = (&w * &modpow_signed(share.xi(), &exponent, n)?).nmod(n);
    }

    // Bezout relation a·4 + b·e = 1; it exists because e is an odd prime.
    let (g, a, b) = extended_gcd(&BigNumber::from(4u64), meta.public_exponent());
    if g != BigNumber::one() {
        error!("Public exponent is not coprime with 4");
        return Err(Error::InternalInvariantFailed);
    }

    let mut y = (modpow_signed(&w, &a, n)? * modpow_signed(&x, &b, n)?).nmod(n);
    if corrected {
        let u_inv = meta.verification_key().u().invert(n).ok_or_else(|| {
            error!("Normalisation value U is not invertible modulo n");
            Error::InternalInvariantFailed
        })?;
        y = (&y * &u_inv).nmod(n);
    }

    let raw = y.to_bytes();
    let length = meta.signature_length();
    if raw.len() > length {
        error!("Combined value is longer than the modulus");
        return Err(Error::InternalInvariantFailed);
    }
    let mut bytes = vec![0u8; length];
    bytes[length - raw.len()..].copy_from_slice(&raw);
    Ok(Signature(bytes))
}

/// The integer Lagrange coefficient at zero for interpolation point `j`
/// over `points`, scaled by `delta = l!`.
///
/// `delta` absorbs every denominator that can occur for points in
/// `[1, l]`, so the division below is exact.
fn lagrange_coefficient(points: &[u16], j: u16, delta: &BigNumber) -> BigNumber {
    let mut numerator = delta.clone();
    let mut denominator = BigNumber::one();
    for &i in points {
        if i != j {
            numerator = numerator * BigNumber::from(u64::from(i));
            denominator =
                denominator * (BigNumber::from(u64::from(i)) - BigNumber::from(u64::from(j)));
        }
    }
    numerator / denominator
}
