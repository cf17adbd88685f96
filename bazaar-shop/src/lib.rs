//! Shop state aggregate and signed patch set verification
//!
//! This crate ties the lower layers together: the [`Shop`] aggregate folds
//! the manifest and the five state tries into the single 32-byte shop root,
//! and the [`patches`] module commits an ordered patch list with a mountain
//! range, signs the resulting header and verifies inbound patch sets.

pub mod patches;
pub mod shop;

pub use patches::{
    root_of_patches, sign_patch_set, signer_of_patch_set, verify_proof, verify_signed_patch_set,
    Error,
};
pub use shop::Shop;
