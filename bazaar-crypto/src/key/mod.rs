//! Asymmetric keys used to authorise patch sets
//!
//! The protocol identifies writers by Ethereum-style secp256k1 key cards.
//! Signatures are recoverable, so verification yields the signer address
//! instead of taking a public key as input.

pub mod secp256k1;
