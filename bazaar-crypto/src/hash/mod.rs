//! Cryptographic Hash for the Bazaar state commitments
//!
//! we expose two helper objects:
//!
//! * [`Hasher`] to help streaming objects or bytes into a hasher and computing
//!   a hash without allocating extra memory due to the required **CBOR**
//!   encoding for everything committed by the protocol
//! * [`struct@Hash`] a conveniently strongly typed byte array
//!
//! The algorithm exposed here is `SHA-256`, the only digest used for content
//! commitments (trie nodes, mountain range nodes and patch leaves). The
//! Keccak-256 digest required by message signing lives in [`crate::eip191`].
//!
//! # Example
//!
//! ```
//! use bazaar_crypto::hash::Hasher;
//!
//! let mut hasher = Hasher::<256>::new();
//! hasher.input(b"my key");
//!
//! let digest = hasher.finalize();
//! # assert_eq!(
//! #   "a0e12d601e10154fe5743fd6d2ba37492365077b485f06c131ef495420005253",
//! #   hex::encode(digest)
//! # );
//! ```

#[allow(clippy::module_inception)]
mod hash;
mod hasher;

pub use self::{hash::Hash, hasher::Hasher};
