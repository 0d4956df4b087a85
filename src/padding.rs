// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Document preparation: EMSA-PKCS1-v1_5 and EMSA-PSS encodings.
//!
//! Signing operates on a message representative of the modulus length, not
//! on the raw message. These helpers turn a digest into that
//! representative; the result feeds straight into
//! [`KeyShare::sign`](crate::KeyShare::sign) and the combined signature
//! then verifies under any standard RSA implementation using the matching
//! padding mode.

use crate::errors::{Error, Result};
use rand::{CryptoRng, RngCore};
use sha2::Digest;
use tracing::error;

// ASN.1 DigestInfo prefixes, keyed by digest length.
const SHA256_PREFIX: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];
const SHA384_PREFIX: [u8; 19] = [
    0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02,
    0x05, 0x00, 0x04, 0x30,
];
const SHA512_PREFIX: [u8; 19] = [
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03,
    0x05, 0x00, 0x04, 0x40,
];

fn digest_info_prefix(output_size: usize) -> Result<&'static [u8]> {
    match output_size {
        32 => Ok(&SHA256_PREFIX),
        48 => Ok(&SHA384_PREFIX),
        64 => Ok(&SHA512_PREFIX),
        _ => {
            error!("No DigestInfo prefix for a {output_size}-byte digest");
            Err(Error::BadParameter("unsupported digest algorithm"))
        }
    }
}

/// Encode a digest with EMSA-PKCS1-v1_5 to `key_length` bytes.
///
/// `key_length` is the byte length of the modulus
/// ([`KeyMeta::signature_length`](crate::KeyMeta::signature_length)).
/// Supported digests are SHA-256, SHA-384, and SHA-512.
pub fn prepare_document_hash<D: Digest>(key_length: usize, digest: &[u8]) -> Result<Vec<u8>> {
    if digest.len() != <D as Digest>::output_size() {
        error!(
            "Digest is {} bytes but the hash algorithm produces {}",
            digest.len(),
            <D as Digest>::output_size()
        );
        return Err(Error::BadParameter("digest length does not match the hash"));
    }
    let prefix = digest_info_prefix(<D as Digest>::output_size())?;
    let info_length = prefix.len() + digest.len();
    if key_length < info_length + 11 {
        error!("A {key_length}-byte modulus cannot hold this DigestInfo");
        return Err(Error::BadParameter("modulus too short for this digest"));
    }

    // 0x00 || 0x01 || PS (0xff) || 0x00 || DigestInfo
    let mut encoded = vec![0xff_u8; key_length];
    encoded[0] = 0x00;
    encoded[1] = 0x01;
    encoded[key_length - info_length - 1] = 0x00;
    encoded[key_length - info_length..key_length - digest.len()].copy_from_slice(prefix);
    encoded[key_length - digest.len()..].copy_from_slice(digest);
    Ok(encoded)
}

/// Options for EMSA-PSS encoding.
#[derive(Debug, Clone, Default)]
pub struct PssOptions {
    /// Salt length in bytes. A length of zero produces a deterministic
    /// encoding; verifiers must be told the same length.
    pub salt_length: usize,
}

/// Encode a digest with EMSA-PSS to `modulus_bits - 1` bits.
///
/// `modulus_bits` is the exact bit length of the modulus. The mask
/// generation function is MGF1 over the same digest `D`.
pub fn prepare_pss_document_hash<D: Digest, R: RngCore + CryptoRng>(
    modulus_bits: usize,
    digest: &[u8],
    options: &PssOptions,
    rng: &mut R,
) -> Result<Vec<u8>> {
    if digest.len() != <D as Digest>::output_size() {
        error!(
            "Digest is {} bytes but the hash algorithm produces {}",
            digest.len(),
            <D as Digest>::output_size()
        );
        return Err(Error::BadParameter("digest length does not match the hash"));
    }
    if modulus_bits < 2 {
        return Err(Error::BadParameter("modulus bit length too small"));
    }

    let em_bits = modulus_bits - 1;
    let em_length = (em_bits + 7) / 8;
    let hash_length = <D as Digest>::output_size();
    let salt_length = options.salt_length;
    if em_length < hash_length + salt_length + 2 {
        error!(
            "A {em_length}-byte encoding cannot hold a {hash_length}-byte digest and a \
             {salt_length}-byte salt"
        );
        return Err(Error::BadParameter("modulus too short for this digest and salt"));
    }

    let mut salt = vec![0u8; salt_length];
    if salt_length > 0 {
        rng.try_fill_bytes(&mut salt).map_err(|e| {
            error!("System RNG failed to produce a {salt_length}-byte salt: {e}");
            Error::RngFailure
        })?;
    }

    // H = Hash(0x00 * 8 || mHash || salt)
    let mut hasher = D::new();
    hasher.update([0u8; 8]);
    hasher.update(digest);
    hasher.update(&salt);
    let h = hasher.finalize();

    // DB = PS || 0x01 || salt, masked with MGF1(H)
    let db_length = em_length - hash_length - 1;
    let mut db = vec![0u8; db_length];
    db[db_length - salt_length - 1] = 0x01;
    db[db_length - salt_length..].copy_from_slice(&salt);
    mgf1_xor::<D>(&mut db, &h);
    db[0] &= 0xff >> (8 * em_length - em_bits);

    let mut encoded = Vec::with_capacity(em_length);
    encoded.extend_from_slice(&db);
    encoded.extend_from_slice(&h);
    encoded.push(0xbc);
    Ok(encoded)
}

/// XOR the MGF1 output stream for `seed` into `out`.
fn mgf1_xor<D: Digest>(out: &mut [u8], seed: &[u8]) {
    let mut counter = 0u32;
    let mut offset = 0usize;
    while offset < out.len() {
        let mut hasher = D::new();
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        for byte in hasher.finalize() {
            if offset == out.len() {
                break;
            }
            out[offset] ^= byte;
            offset += 1;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::init_testing;
    use sha2::Sha256;

    const KEY_LENGTH: usize = 64;

    #[test]
    fn pkcs1_encoding_has_the_documented_layout() {
        let digest = Sha256::digest(b"Hello World");
        let encoded = prepare_document_hash::<Sha256>(KEY_LENGTH, &digest).unwrap();

        assert_eq!(encoded.len(), KEY_LENGTH);
        assert_eq!(&encoded[..2], &[0x00, 0x01]);
        let info_length = SHA256_PREFIX.len() + digest.len();
        assert!(encoded[2..KEY_LENGTH - info_length - 1]
            .iter()
            .all(|&b| b == 0xff));
        assert_eq!(encoded[KEY_LENGTH - info_length - 1], 0x00);
        assert_eq!(&encoded[KEY_LENGTH - digest.len()..], digest.as_slice());
    }

    #[test]
    fn pkcs1_rejects_moduli_that_cannot_hold_the_digest_info() {
        let digest = Sha256::digest(b"Hello World");
        let result = prepare_document_hash::<Sha256>(60, &digest);
        assert!(matches!(result, Err(Error::BadParameter(_))));
    }

    #[test]
    fn pkcs1_rejects_mismatched_digest_lengths() {
        let result = prepare_document_hash::<Sha256>(KEY_LENGTH, &[0u8; 20]);
        assert!(matches!(result, Err(Error::BadParameter(_))));
    }

    #[test]
    fn pss_encoding_has_the_documented_length_and_trailer() {
        let mut rng = init_testing();
        let digest = Sha256::digest(b"Hello World , Pss Encoding");
        let encoded = prepare_pss_document_hash::<Sha256, _>(
            4096,
            &digest,
            &PssOptions { salt_length: 0 },
            &mut rng,
        )
        .unwrap();

        assert_eq!(encoded.len(), 4096 / 8);
        assert_eq!(*encoded.last().unwrap(), 0xbc);
    }

    #[test]
    fn pss_with_empty_salt_is_deterministic() {
        let mut rng = init_testing();
        let digest = Sha256::digest(b"Hello World");
        let options = PssOptions { salt_length: 0 };
        let first =
            prepare_pss_document_hash::<Sha256, _>(511, &digest, &options, &mut rng).unwrap();
        let second =
            prepare_pss_document_hash::<Sha256, _>(511, &digest, &options, &mut rng).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn pss_with_salt_is_randomised() {
        let mut rng = init_testing();
        let digest = Sha256::digest(b"Hello World");
        let options = PssOptions { salt_length: 16 };
        let first =
            prepare_pss_document_hash::<Sha256, _>(2048, &digest, &options, &mut rng).unwrap();
        let second =
            prepare_pss_document_hash::<Sha256, _>(2048, &digest, &options, &mut rng).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn pss_rejects_moduli_that_cannot_hold_digest_and_salt() {
        let mut rng = init_testing();
        let digest = Sha256::digest(b"Hello World");
        let result = prepare_pss_document_hash::<Sha256, _>(
            256,
            &digest,
            &PssOptions { salt_length: 32 },
            &mut rng,
        );
        assert!(matches!(result, Err(Error::BadParameter(_))));
    }
}
