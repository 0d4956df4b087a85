// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use unknown_order::BigNumber;
use zeroize::ZeroizeOnDrop;

/// One participant's share of the RSA private exponent.
///
/// The secret value is `s_i = Δ⁻¹ · f(i) mod m`, where `f` is the dealer's
/// sharing polynomial, `Δ = l!`, and `m = p'q'`. It must never leave the
/// participant that holds it; the public counterpart used to check this
/// participant's signature shares is the verification value `V_i` stored in
/// [`KeyMeta`](crate::KeyMeta).
///
/// The share does not carry a reference back to its [`KeyMeta`]; the
/// metadata is passed into every operation that needs it.
#[derive(Clone, ZeroizeOnDrop, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShare {
    index: u16,
    secret: BigNumber,
}

impl Debug for KeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyShare")
            .field("index", &self.index)
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl KeyShare {
    pub(crate) fn new(index: u16, secret: BigNumber) -> Self {
        Self { index, secret }
    }

    /// The 1-based index of the participant holding this share.
    pub fn index(&self) -> u16 {
        self.index
    }

    pub(crate) fn secret(&self) -> &BigNumber {
        &self.secret
    }
}
