//! secp256k1 Asymmetric Keys and recoverable signatures
//!
//! In this module we have [`SecretKey`], a secp256k1 scalar that can produce
//! recoverable [`Signature`]s, and [`PublicKey`], the 33-byte compressed
//! SEC1 point used as a key card identity on the wire.

use bazaar_codec::minicbor;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rand_core::{CryptoRng, RngCore};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::eip191;
use crate::hash::Hash;

/// secp256k1 Secret Key
#[derive(Clone)]
pub struct SecretKey(SigningKey);

/// secp256k1 Public Key in compressed SEC1 form. Identifies a key card and
/// can be turned into the signer's Ethereum-style address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; Self::SIZE]);

/// Recoverable ECDSA signature in Ethereum's 65-byte `(r, s, v)` layout.
/// Is created by a [`SecretKey`]; verification recovers the signer address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; Self::SIZE]);

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid secret key scalar")]
    InvalidSecretKey,

    #[error("invalid compressed public key point")]
    InvalidPublicKey,

    #[error("invalid signature, could not recover the signer")]
    InvalidSignature,

    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
}

impl SecretKey {
    /// This is the size of the scalar in bytes.
    pub const SIZE: usize = 32;

    /// generate a new [`SecretKey`] with the given random number generator
    pub fn new<Rng>(mut rng: Rng) -> Self
    where
        Rng: RngCore + CryptoRng,
    {
        Self(SigningKey::random(&mut rng))
    }

    /// get the [`PublicKey`] associated to this key
    pub fn public_key(&self) -> PublicKey {
        let point = self.0.verifying_key().to_encoded_point(true);

        let mut bytes = [0; PublicKey::SIZE];
        bytes.copy_from_slice(point.as_bytes());
        PublicKey(bytes)
    }

    /// sign a 32-byte digest, producing a recoverable `(r, s, v)` signature
    /// with `v` in the Ethereum convention (`27` or `28`)
    pub fn sign(&self, digest: &Hash<32>) -> Result<Signature, Error> {
        let (signature, recovery_id) = self
            .0
            .sign_prehash_recoverable(digest.as_ref())
            .map_err(|_| Error::InvalidSecretKey)?;

        let mut bytes = [0; Signature::SIZE];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Ok(Signature(bytes))
    }

    /// sign an arbitrary message under the EIP-191 personal-sign convention
    pub fn sign_personal(&self, message: &[u8]) -> Result<Signature, Error> {
        self.sign(&eip191::personal_sign_digest(message))
    }
}

impl TryFrom<[u8; SecretKey::SIZE]> for SecretKey {
    type Error = Error;

    fn try_from(value: [u8; SecretKey::SIZE]) -> Result<Self, Self::Error> {
        let key = SigningKey::from_slice(&value).map_err(|_| Error::InvalidSecretKey)?;
        Ok(Self(key))
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let key = SigningKey::from_slice(value).map_err(|_| Error::InvalidSecretKey)?;
        Ok(Self(key))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey<secp256k1>(***)")
    }
}

impl PublicKey {
    /// This is the size of the compressed SEC1 point in bytes.
    pub const SIZE: usize = 33;

    /// derive the Ethereum-style address of this key: the trailing 20 bytes
    /// of the Keccak-256 digest of the uncompressed point
    pub fn address(&self) -> Result<Hash<20>, Error> {
        let key = VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| Error::InvalidPublicKey)?;
        Ok(eip191::address_of(&key))
    }
}

impl From<[u8; PublicKey::SIZE]> for PublicKey {
    fn from(value: [u8; PublicKey::SIZE]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Self::SIZE] = value.try_into().map_err(|_| Error::InvalidPublicKey)?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&hex::encode(self)).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self))
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidPublicKey)?;
        Self::try_from(bytes.as_slice())
    }
}

impl<C> minicbor::Encode<C> for PublicKey {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PublicKey {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let bytes = d.bytes()?;
        PublicKey::try_from(bytes)
            .map_err(|_| minicbor::decode::Error::message("Invalid public key size"))
    }
}

impl Signature {
    /// This is the size of the signature in bytes.
    pub const SIZE: usize = 65;

    /// recover the public key that produced this signature over `digest`
    pub fn recover(&self, digest: &Hash<32>) -> Result<PublicKey, Error> {
        let v = self.0[64];
        let recovery_byte = if v >= 27 { v - 27 } else { v };
        let recovery_id =
            RecoveryId::from_byte(recovery_byte).ok_or(Error::InvalidRecoveryId(v))?;

        let signature =
            EcdsaSignature::from_slice(&self.0[..64]).map_err(|_| Error::InvalidSignature)?;

        let key = VerifyingKey::recover_from_prehash(digest.as_ref(), &signature, recovery_id)
            .map_err(|_| Error::InvalidSignature)?;

        let point = key.to_encoded_point(true);
        let mut bytes = [0; PublicKey::SIZE];
        bytes.copy_from_slice(point.as_bytes());
        Ok(PublicKey(bytes))
    }

    /// recover the Ethereum-style address that produced this signature
    pub fn recover_address(&self, digest: &Hash<32>) -> Result<Hash<20>, Error> {
        let v = self.0[64];
        let recovery_byte = if v >= 27 { v - 27 } else { v };
        let recovery_id =
            RecoveryId::from_byte(recovery_byte).ok_or(Error::InvalidRecoveryId(v))?;

        let signature =
            EcdsaSignature::from_slice(&self.0[..64]).map_err(|_| Error::InvalidSignature)?;

        let key = VerifyingKey::recover_from_prehash(digest.as_ref(), &signature, recovery_id)
            .map_err(|_| Error::InvalidSignature)?;

        Ok(eip191::address_of(&key))
    }
}

impl From<[u8; Signature::SIZE]> for Signature {
    fn from(value: [u8; Signature::SIZE]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Self::SIZE] = value.try_into().map_err(|_| Error::InvalidSignature)?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&hex::encode(self)).finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidSignature)?;
        Self::try_from(bytes.as_slice())
    }
}

impl<C> minicbor::Encode<C> for Signature {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Signature {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let bytes = d.bytes()?;
        Signature::try_from(bytes)
            .map_err(|_| minicbor::decode::Error::message("Invalid signature size"))
    }
}
