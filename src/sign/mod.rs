// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Per-share signing.[^cite]
//!
//! Each holder of a [`KeyShare`] raises the prepared document to twice its
//! secret exponent and attaches a Schnorr-style proof that the exponent is
//! the one fixed at key generation. The proof is non-interactive: the
//! challenge is a hash over the public values and the prover's commitments,
//! so shares can be produced and checked without any coordination.
//!
//! Documents are normalised before signing: a document whose Jacobi symbol
//! with respect to the modulus is `-1` is multiplied by `U^e`, which lands
//! it in the subgroup where the combining identity holds. The combiner
//! undoes the correction after interpolation.
//!
//! [^cite]: Victor Shoup. Practical Threshold Signatures. Eurocrypt 2000.
//! [PDF](http://www.iacr.org/archive/eurocrypt2000/1807/18070209-new.pdf).
//! Section 3.

mod share;

pub use share::SignatureShare;

use crate::{
    errors::{Error, Result},
    keygen::{KeyMeta, KeyShare},
    utils::{jacobi, random_bits},
};
use rand::{CryptoRng, RngCore};
use sha2::Digest;
use tracing::error;
use unknown_order::BigNumber;
use zeroize::Zeroize;

/// Interpret a prepared document as an integer with Jacobi symbol `+1`
/// modulo `n`.
///
/// Returns the (possibly corrected) representative and whether the `U^e`
/// correction was applied.
pub(crate) fn normalize_document(
    document: &[u8],
    meta: &KeyMeta,
) -> Result<(BigNumber, bool)> {
    if document.is_empty() {
        error!("Cannot sign an empty document");
        return Err(Error::BadParameter("document must not be empty"));
    }
    let n = meta.modulus();
    let x = BigNumber::from_slice(document);
    if jacobi(&x, n) == -1 {
        let u_e = meta
            .verification_key()
            .u()
            .modpow(meta.public_exponent(), n);
        Ok(((&x * &u_e).nmod(n), true))
    } else {
        Ok((x, false))
    }
}

impl KeyShare {
    /// Produce a [`SignatureShare`] over a prepared document.
    ///
    /// `document` must already be padded to the modulus length (see
    /// [`padding`](crate::padding)). `D` is the hash used for the proof
    /// challenge; verifiers must use the same one. SHA-256 is the default
    /// choice throughout this crate.
    pub fn sign<D: Digest, R: RngCore + CryptoRng>(
        &self,
        document: &[u8],
        meta: &KeyMeta,
        rng: &mut R,
    ) -> Result<SignatureShare> {
        let n = meta.modulus();
        let (x, _) = normalize_document(document, meta)?;
        let v_i = meta
            .verification_key()
            .share_key(self.index())
            .ok_or_else(|| {
                error!(
                    "No verification value for signer {}; the share does not belong to this key",
                    self.index()
                );
                Error::InternalInvariantFailed
            })?;

        let two = BigNumber::from(2u64);
        let xi = x.modpow(&(self.secret() * &two), n);
        let x_tilde = x.modpow(&BigNumber::from(4u64), n);
        let xi_squared = xi.modpow(&two, n);

        // The nonce is oversized by twice the challenge length so that
        // z = c·s_i + r statistically hides the share.
        let nonce_bits = n.bit_length() + 2 * D::output_size() * 8;
        let mut nonce = random_bits(nonce_bits, rng)?;

        let v_prime = meta.verification_key().v().modpow(&nonce, n);
        let x_prime = x_tilde.modpow(&nonce, n);
        let challenge =
            share::challenge::<D>(meta, v_i, &x_tilde, &xi_squared, &v_prime, &x_prime);
        let response = &challenge * self.secret() + &nonce;
        nonce.zeroize();

        Ok(SignatureShare::new(self.index(), xi, challenge, response))
    }
}
