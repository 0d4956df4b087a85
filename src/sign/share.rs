// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use crate::{
    errors::{Error, Result},
    keygen::KeyMeta,
    sign::normalize_document,
};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use tracing::error;
use unknown_order::BigNumber;

/// A single participant's share of an RSA signature, with its proof of
/// correctness.
///
/// The share carries `x_i = x^{2 s_i} mod n` together with the proof pair
/// `(c, z)`: `c` is the hash challenge reduced mod `n` and `z = c·s_i + r`
/// is the response over the integers, deliberately left unreduced because
/// the verifier exponentiates by it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureShare {
    index: u16,
    xi: BigNumber,
    challenge: BigNumber,
    response: BigNumber,
}

impl SignatureShare {
    pub(crate) fn new(
        index: u16,
        xi: BigNumber,
        challenge: BigNumber,
        response: BigNumber,
    ) -> Self {
        Self {
            index,
            xi,
            challenge,
            response,
        }
    }

    /// The 1-based index of the participant that produced this share.
    pub fn index(&self) -> u16 {
        self.index
    }

    pub(crate) fn xi(&self) -> &BigNumber {
        &self.xi
    }

    /// Check this share's proof of correctness against the prepared
    /// document it claims to sign.
    ///
    /// `D` must be the hash the signer used. A share that fails this check
    /// is reported as [`Error::InvalidSignatureShare`]; the caller may
    /// discard it and collect a share from another participant instead.
    pub fn verify<D: Digest>(&self, document: &[u8], meta: &KeyMeta) -> Result<()> {
        let n = meta.modulus();
        let invalid = || Error::InvalidSignatureShare { id: self.index };

        let (x, _) = normalize_document(document, meta)?;
        let v_i = meta
            .verification_key()
            .share_key(self.index)
            .ok_or_else(|| {
                error!("Signature share names unknown signer {}", self.index);
                invalid()
            })?;

        let x_tilde = x.modpow(&BigNumber::from(4u64), n);
        let xi_squared = self.xi.modpow(&BigNumber::from(2u64), n);

        // Recompute the prover's commitments from the public equation:
        // v' = V^z · V_i^{-c} and x' = x̃^z · x_i^{-2c}.
        let v_i_c_inv = v_i
            .modpow(&self.challenge, n)
            .invert(n)
            .ok_or_else(invalid)?;
        let v_prime = (meta.verification_key().v().modpow(&self.response, n) * v_i_c_inv).nmod(n);
        let xi_2c_inv = xi_squared
            .modpow(&self.challenge, n)
            .invert(n)
            .ok_or_else(invalid)?;
        let x_prime = (x_tilde.modpow(&self.response, n) * xi_2c_inv).nmod(n);

        let expected = challenge::<D>(meta, v_i, &x_tilde, &xi_squared, &v_prime, &x_prime);
        if expected == self.challenge {
            Ok(())
        } else {
            error!("Signature share from signer {} failed its proof", self.index);
            Err(invalid())
        }
    }
}

/// The Fiat-Shamir challenge, reduced mod `n`.
///
/// Every field is fed to the hash as its minimal big-endian encoding, in a
/// fixed order shared by prover and verifier.
pub(crate) fn challenge<D: Digest>(
    meta: &KeyMeta,
    v_i: &BigNumber,
    x_tilde: &BigNumber,
    xi_squared: &BigNumber,
    v_prime: &BigNumber,
    x_prime: &BigNumber,
) -> BigNumber {
    let mut hasher = D::new();
    hasher.update(meta.verification_key().v().to_bytes());
    hasher.update(meta.verification_key().u().to_bytes());
    hasher.update(x_tilde.to_bytes());
    hasher.update(v_i.to_bytes());
    hasher.update(xi_squared.to_bytes());
    hasher.update(v_prime.to_bytes());
    hasher.update(x_prime.to_bytes());
    BigNumber::from_slice(hasher.finalize()).nmod(meta.modulus())
}
