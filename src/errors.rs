// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Error types for the threshold RSA engine.
//!
//! Detailed context (offending values, expected ranges) is emitted through
//! [`tracing`] at the site where the error is raised; the variants
//! themselves stay small so callers can match on the failure kind.

use thiserror::Error;

/// The default Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by key generation, signing, verification, and
/// combination.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A caller-supplied parameter was out of range or malformed.
    ///
    /// Raised for bit sizes outside [512, 4096], threshold parameters that
    /// violate `1 < k <= l` or `k >= l/2 + 1`, non-prime or wrongly sized
    /// prime overrides, an `r` override that shares a factor with the
    /// modulus, and empty documents.
    #[error("invalid parameter: {0}")]
    BadParameter(&'static str),

    /// The operating system's random source failed or repeatedly produced
    /// unusable output.
    #[error("random source failure")]
    RngFailure,

    /// The safe-prime search exhausted its retry budget.
    #[error("safe prime search exhausted its retry budget")]
    PrimalityFailure,

    /// Fewer signature shares were supplied than the threshold requires.
    #[error("not enough signature shares (got {got}, need {need})")]
    InsufficientShares {
        /// Number of shares supplied.
        got: usize,
        /// Threshold fixed at key generation.
        need: usize,
    },

    /// A signature share failed its proof of correctness.
    ///
    /// Non-fatal to a combiner, which may drop the share and try another.
    #[error("signature share from signer {id} failed verification")]
    InvalidSignatureShare {
        /// Index of the signer whose share was rejected.
        id: u16,
    },

    /// An arithmetic invariant that key generation guarantees did not hold.
    #[error("internal invariant failed; this should not happen")]
    InternalInvariantFailed,
}
