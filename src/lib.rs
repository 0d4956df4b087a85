// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Implementation of Shoup's threshold RSA signature scheme.[^cite]
//!
//! In a threshold signature scheme, a subset `k` of `l` signers, each of
//! whom hold a share of a private signing key, can cooperate to produce a
//! valid signature for a message, while any subset of `k - 1` signers is
//! unable to forge signatures.
//!
//! This scheme is specific to RSA: a trusted dealer generates an RSA
//! keypair and splits the private exponent into [`KeyShare`]s, and the
//! signatures assembled from any `k` shares are ordinary RSA signatures,
//! indistinguishable from ones produced with the whole private key and
//! verifiable by any standard (non-threshold) RSA verification routine.
//! Each partial signature carries a non-interactive proof of correctness,
//! so misbehaving signers are identified before their contribution can
//! spoil the combined signature.
//!
//! The expected flow is:
//! 1. [`generate_key`] deals a [`KeyMeta`] and one [`KeyShare`] per signer.
//! 2. Each signer prepares the message representative with
//!    [`padding::prepare_document_hash`] (PKCS#1 v1.5) or
//!    [`padding::prepare_pss_document_hash`] (PSS) and calls
//!    [`KeyShare::sign`], producing a [`SignatureShare`].
//! 3. Anyone checks shares with [`SignatureShare::verify`] and combines
//!    `k` good ones with [`join`] into a [`Signature`].
//!
//! Note that this library only provides the cryptographic core; it does
//! not handle communication between signers, storage of shares, or signer
//! authentication. Call [`enable_wipe_on_free`] once at startup so that
//! big integers wiped by this crate do not leave copies in allocator
//! memory.
//!
//! [^cite]: Victor Shoup. Practical Threshold Signatures. Eurocrypt 2000.
//! [PDF](http://www.iacr.org/archive/eurocrypt2000/1807/18070209-new.pdf).

#![warn(missing_docs)]

pub mod combine;
pub mod errors;
pub mod keygen;
pub mod padding;
mod polynomial;
mod prime_gen;
pub mod sign;
mod utils;
mod wipe;

pub use combine::{join, Signature};
pub use errors::{Error, Result};
pub use keygen::{generate_key, KeyMeta, KeyShare, KeygenOverrides, VerificationKey};
pub use sign::SignatureShare;
pub use wipe::enable_wipe_on_free;

// Re-exported so callers can build [`KeygenOverrides`] and inspect key
// material without naming the arithmetic crate themselves.
pub use unknown_order::BigNumber;
