//! EIP-191 personal-sign message digests
//!
//! Patch set headers are signed under the `personal_sign` convention: the
//! CBOR-encoded header is prefixed with `"\x19Ethereum Signed Message:\n"`
//! and the decimal message length before being hashed with Keccak-256. The
//! resulting 32-byte digest is what the secp256k1 key actually signs.

use k256::ecdsa::VerifyingKey;
use sha3::{Digest as _, Keccak256};

use crate::hash::Hash;
use crate::key::secp256k1::{Error, Signature};

const PERSONAL_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Keccak-256 digest of the given bytes
pub fn keccak256(bytes: &[u8]) -> Hash<32> {
    let mut hash = [0; 32];
    hash.copy_from_slice(&Keccak256::digest(bytes));
    Hash::new(hash)
}

/// the digest signed for `message` under the personal-sign convention
pub fn personal_sign_digest(message: &[u8]) -> Hash<32> {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);

    let mut hash = [0; 32];
    hash.copy_from_slice(&hasher.finalize());
    Hash::new(hash)
}

/// recover the address that personal-signed `message`
pub fn recover_signer(message: &[u8], signature: &Signature) -> Result<Hash<20>, Error> {
    signature.recover_address(&personal_sign_digest(message))
}

/// the Ethereum-style address of a verifying key: the trailing 20 bytes of
/// the Keccak-256 digest of the uncompressed point, without its `0x04` tag
pub(crate) fn address_of(key: &VerifyingKey) -> Hash<20> {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);

    let mut address = [0; 20];
    address.copy_from_slice(&digest[12..]);
    Hash::new(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_vectors() {
        assert_eq!(
            keccak256(b"").to_string(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            keccak256(b"abc").to_string(),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn personal_sign_vector() {
        // well-known personal_sign digest for "hello world"
        assert_eq!(
            personal_sign_digest(b"hello world").to_string(),
            "d9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68"
        );
    }

    #[test]
    fn prefix_length_is_decimal() {
        // a 100-byte message embeds the three-character length "100"
        let message = vec![0x61; 100];

        let mut manual = Vec::new();
        manual.extend_from_slice(PERSONAL_SIGN_PREFIX);
        manual.extend_from_slice(b"100");
        manual.extend_from_slice(&message);

        assert_eq!(personal_sign_digest(&message), keccak256(&manual));
    }
}
