//! Committing, signing and verifying patch sets

use bazaar_codec::minicbor;
use bazaar_crypto::eip191;
use bazaar_crypto::hash::{Hash, Hasher};
use bazaar_crypto::key::secp256k1::{self, SecretKey};
use bazaar_mmr::{included_root, verify_inclusion_path, Mmr};
use bazaar_primitives::{EthereumAddress, Patch, PatchSetHeader, SignedPatchSet, Timestamp, Uint256};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum Error {
    #[error("root mismatch: calculated {calculated} but expected {expected}")]
    RootMismatch {
        calculated: Hash<32>,
        expected: Hash<32>,
    },

    #[error("failed to verify inclusion path")]
    Verification,

    #[error("path length mismatch: consumed {consumed} elements but path has {total}")]
    PathLength { consumed: usize, total: usize },

    #[error("unauthorized signer {signer}, expected {expected}")]
    UnauthorizedSigner {
        signer: EthereumAddress,
        expected: EthereumAddress,
    },

    #[error("patch set carries no patches")]
    EmptyPatchSet,

    #[error("invalid patch set header: {0}")]
    InvalidHeader(String),

    #[error(transparent)]
    Signature(#[from] secp256k1::Error),

    #[error(transparent)]
    Mmr(#[from] bazaar_mmr::Error),
}

/// Computes the 32-byte commitment of an ordered patch list
///
/// Each patch hashes to a leaf through its canonical encoding; the list is
/// padded with the empty-string hash up to the next power of two, so the
/// mountain range always collapses into a single peak.
pub fn root_of_patches(patches: &[Patch]) -> Result<Hash<32>, Error> {
    if patches.is_empty() {
        return Err(Error::EmptyPatchSet);
    }

    let mut leaves: Vec<Hash<32>> = patches
        .iter()
        .map(|patch| Hasher::<256>::hash_cbor(patch))
        .collect();

    let zero = Hasher::<256>::hash(b"");
    leaves.resize(leaves.len().next_power_of_two(), zero);

    let mut mmr = Mmr::new();
    for leaf in leaves {
        mmr.push_leaf(leaf);
    }

    Ok(mmr.root()?)
}

/// Builds a patch set over `patches` and signs its header with `key`
pub fn sign_patch_set(
    key: &SecretKey,
    key_card_nonce: u64,
    shop_id: Uint256,
    timestamp: Timestamp,
    patches: Vec<Patch>,
) -> Result<SignedPatchSet, Error> {
    let root_hash = root_of_patches(&patches)?;

    let header = PatchSetHeader {
        key_card_nonce,
        shop_id,
        timestamp,
        root_hash,
    };
    let header_bytes =
        minicbor::to_vec(header).map_err(|err| Error::InvalidHeader(err.to_string()))?;

    let signature = key.sign_personal(&header_bytes)?;

    Ok(SignedPatchSet {
        header,
        signature,
        patches,
    })
}

/// Recomputes the patch root and recovers the address that signed the set
///
/// Fails when the header's root does not match the patches, so a recovered
/// signer always vouches for the exact patch list carried by the set.
pub fn signer_of_patch_set(set: &SignedPatchSet) -> Result<EthereumAddress, Error> {
    let calculated = root_of_patches(&set.patches)?;
    if calculated != set.header.root_hash {
        return Err(Error::RootMismatch {
            calculated,
            expected: set.header.root_hash,
        });
    }

    let header_bytes =
        minicbor::to_vec(set.header).map_err(|err| Error::InvalidHeader(err.to_string()))?;

    let digest = eip191::personal_sign_digest(&header_bytes);
    let signer: EthereumAddress = set.signature.recover_address(&digest)?.into();

    debug!(%signer, patches = set.patches.len(), "recovered patch set signer");
    Ok(signer)
}

/// Verifies a signed patch set against the signer it claims to come from
pub fn verify_signed_patch_set(
    set: &SignedPatchSet,
    expected_signer: &EthereumAddress,
) -> Result<(), Error> {
    let signer = signer_of_patch_set(set)?;

    if signer != *expected_signer {
        return Err(Error::UnauthorizedSigner {
            signer,
            expected: *expected_signer,
        });
    }

    Ok(())
}

/// Verifies that `element` sits at `leaf_index` under `wanted_root`
///
/// The diagnostics distinguish a wrong root from a proof that folds to the
/// root early or not at all.
pub fn verify_proof(
    leaf_index: u64,
    element: &Hash<32>,
    path: &[Hash<32>],
    wanted_root: &Hash<32>,
) -> Result<(), Error> {
    let root = included_root(leaf_index, element, path);
    if &root != wanted_root {
        return Err(Error::RootMismatch {
            calculated: root,
            expected: *wanted_root,
        });
    }

    let (ok, consumed) = verify_inclusion_path(leaf_index, element, path, wanted_root);
    if !ok {
        return Err(Error::Verification);
    }
    if consumed != path.len() {
        return Err(Error::PathLength {
            consumed,
            total: path.len(),
        });
    }

    Ok(())
}
