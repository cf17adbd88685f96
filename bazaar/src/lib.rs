//! Rust-native building blocks for the Bazaar commerce protocol
//!
//! Bazaar is a collection of modules that implements the state-commitment
//! engine of a signed, append-only commerce replication protocol. This crate
//! doesn't provide any particular application, it is meant to be used as a
//! base layer to facilitate the development of higher-level use-cases, such
//! as relays, shop clients or indexers.

#[doc(inline)]
pub use bazaar_codec as codec;

#[doc(inline)]
pub use bazaar_crypto as crypto;

#[doc(inline)]
pub use bazaar_hamt as hamt;

#[doc(inline)]
pub use bazaar_mmr as mmr;

pub mod ledger {
    //! Domain primitives and the aggregate state they roll up into

    #[doc(inline)]
    pub use bazaar_primitives as primitives;

    #[doc(inline)]
    pub use bazaar_shop as shop;
}

#[cfg(test)]
mod tests {
    use crate::crypto::hash::Hasher;
    use crate::hamt::Trie;
    use crate::ledger::shop::root_of_patches;
    use crate::mmr::Mmr;

    #[test]
    fn layers_compose() {
        let mut trie = Trie::new();
        trie.insert(1u64, 10u64);
        let trie_root = trie.hash();

        let mut mmr = Mmr::new();
        mmr.push_leaf(trie_root);
        assert_eq!(mmr.root().unwrap(), trie_root);

        assert_eq!(
            Hasher::<256>::hash(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        assert!(root_of_patches(&[]).is_err());
    }
}
