// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use serde::{Deserialize, Serialize};
use unknown_order::BigNumber;

/// Public verification values for a shared key.
///
/// `V` is a random square modulo `n` (a generator of the squares with
/// overwhelming probability), `U` is an element with Jacobi symbol `-1`
/// used to normalise documents before signing, and `V_i = V^{s_i}` binds
/// participant `i`'s secret exponent without revealing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    v: BigNumber,
    u: BigNumber,
    keys: Vec<BigNumber>,
}

impl VerificationKey {
    /// Build a verification key with room for `share_count` per-participant
    /// values.
    pub(crate) fn new(v: BigNumber, u: BigNumber, share_count: u16) -> Self {
        Self {
            v,
            u,
            keys: Vec::with_capacity(usize::from(share_count)),
        }
    }

    pub(crate) fn push_share_key(&mut self, key: BigNumber) {
        self.keys.push(key);
    }

    /// The base verification value `V`.
    pub fn v(&self) -> &BigNumber {
        &self.v
    }

    /// The Jacobi-normalisation value `U`.
    pub fn u(&self) -> &BigNumber {
        &self.u
    }

    /// Verification value `V_i` for the participant with the given 1-based
    /// index.
    pub fn share_key(&self, index: u16) -> Option<&BigNumber> {
        index
            .checked_sub(1)
            .and_then(|i| self.keys.get(usize::from(i)))
    }

    /// All per-participant verification values, in participant order.
    pub fn share_keys(&self) -> &[BigNumber] {
        &self.keys
    }
}

/// Public metadata for a shared RSA key.
///
/// Everything in here may be published: the RSA public key `(n, e)`, the
/// threshold parameters, and the [`VerificationKey`]. It is immutable once
/// key generation returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMeta {
    n: BigNumber,
    e: BigNumber,
    threshold: u16,
    share_count: u16,
    verification_key: VerificationKey,
}

impl KeyMeta {
    pub(crate) fn new(
        n: BigNumber,
        e: BigNumber,
        threshold: u16,
        share_count: u16,
        verification_key: VerificationKey,
    ) -> Self {
        Self {
            n,
            e,
            threshold,
            share_count,
            verification_key,
        }
    }

    /// The RSA modulus `n = pq`.
    pub fn modulus(&self) -> &BigNumber {
        &self.n
    }

    /// The RSA public exponent `e`.
    pub fn public_exponent(&self) -> &BigNumber {
        &self.e
    }

    /// Number of signature shares needed to produce a signature.
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Total number of key shares that were dealt.
    pub fn share_count(&self) -> u16 {
        self.share_count
    }

    /// The public verification values.
    pub fn verification_key(&self) -> &VerificationKey {
        &self.verification_key
    }

    /// Length in bytes of signatures under this key, which is the byte
    /// length of the modulus.
    pub fn signature_length(&self) -> usize {
        (self.n.bit_length() + 7) / 8
    }
}
