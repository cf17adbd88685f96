//! Persistent hash array mapped trie keyed by SHA-256 of the entry key
//!
//! The shop state is a handful of maps whose whole content must be committed
//! by a single 32-byte digest. This trie consumes the key hash six bits at a
//! time (fan-out 64) and keeps each node's children packed in a bitmap-indexed
//! array, so the structure, the iteration order and the node hashes are a pure
//! function of the key set, never of the insertion order.
//!
//! ```
//! use bazaar_hamt::Trie;
//!
//! let mut trie = Trie::new();
//! trie.insert("price", 100u64);
//! trie.insert(42u64, 1u64);
//!
//! assert_eq!(trie.get("price"), Some(&100));
//! assert_eq!(trie.len(), 2);
//! # let first = trie.hash();
//! # trie.delete(42u64);
//! # assert_ne!(trie.hash(), first);
//! ```

use bazaar_codec::minicbor;
use bazaar_crypto::hash::{Hash, Hasher};
use std::ops::Deref;

const BITS_PER_STEP: usize = 6;
const MAX_DEPTH: usize = 256 / BITS_PER_STEP;

/// A trie key normalised to bytes
///
/// Unsigned integers map to their 8-byte big-endian form, strings to their
/// UTF-8 bytes and byte keys pass through untouched. After normalisation the
/// key is opaque.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrieKey(Vec<u8>);

impl From<u64> for TrieKey {
    fn from(value: u64) -> Self {
        TrieKey(value.to_be_bytes().to_vec())
    }
}

impl From<&str> for TrieKey {
    fn from(value: &str) -> Self {
        TrieKey(value.as_bytes().to_vec())
    }
}

impl From<String> for TrieKey {
    fn from(value: String) -> Self {
        TrieKey(value.into_bytes())
    }
}

impl From<Vec<u8>> for TrieKey {
    fn from(value: Vec<u8>) -> Self {
        TrieKey(value)
    }
}

impl From<&[u8]> for TrieKey {
    fn from(value: &[u8]) -> Self {
        TrieKey(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for TrieKey {
    fn from(value: [u8; N]) -> Self {
        TrieKey(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for TrieKey {
    fn from(value: &[u8; N]) -> Self {
        TrieKey(value.to_vec())
    }
}

impl Deref for TrieKey {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Walks the SHA-256 digest of a key six bits at a time
struct HashState {
    digest: Hash<32>,
    consumed: usize,
}

impl HashState {
    fn new(key: &[u8]) -> Self {
        HashState {
            digest: Hasher::<256>::hash(key),
            consumed: 0,
        }
    }

    /// re-derives the state of `key` at an already consumed bit offset,
    /// used when an occupied slot is split into a branch
    fn forked(key: &[u8], consumed: usize) -> Self {
        HashState {
            digest: Hasher::<256>::hash(key),
            consumed,
        }
    }

    fn next(&mut self) -> usize {
        let bit_offset = self.consumed;
        let byte_offset = bit_offset / 8;
        let bit_in_byte = bit_offset % 8;

        let mut next16: u16 = 0;
        if byte_offset < 32 {
            next16 = (self.digest[byte_offset] as u16) << 8;
        }
        if byte_offset + 1 < 32 {
            next16 |= self.digest[byte_offset + 1] as u16;
        }

        let shift = 16 - BITS_PER_STEP - bit_in_byte;
        let chunk = (next16 >> shift) as usize & ((1 << BITS_PER_STEP) - 1);
        self.consumed += BITS_PER_STEP;
        chunk
    }

    fn exhausted(&self) -> bool {
        self.consumed >= MAX_DEPTH * BITS_PER_STEP
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Entry<V> {
    Leaf { key: Vec<u8>, value: V },
    Branch(Node<V>),
}

#[derive(Clone, Debug)]
struct Node<V> {
    bitmap: u64,
    entries: Vec<Entry<V>>,
    // memoised digest, dropped on any write that touches this node
    cached: Option<Hash<32>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Node {
            bitmap: 0,
            entries: Vec::new(),
            cached: None,
        }
    }
}

impl<V: PartialEq> PartialEq for Node<V> {
    fn eq(&self, other: &Self) -> bool {
        self.bitmap == other.bitmap && self.entries == other.entries
    }
}

impl<V: Eq> Eq for Node<V> {}

fn count_ones_below(bitmap: u64, below: usize) -> usize {
    let mask = (1u64 << below) - 1;
    (bitmap & mask).count_ones() as usize
}

impl<V> Node<V> {
    fn insert(&mut self, key: &[u8], value: V, hs: &mut HashState) -> bool {
        if hs.exhausted() {
            return self.insert_fallback(key, value);
        }

        let idx = hs.next();
        let pos = count_ones_below(self.bitmap, idx);

        if self.bitmap & (1 << idx) == 0 {
            self.bitmap |= 1 << idx;
            self.entries.insert(
                pos,
                Entry::Leaf {
                    key: key.to_vec(),
                    value,
                },
            );
            self.cached = None;
            return true;
        }

        if let Entry::Branch(child) = &mut self.entries[pos] {
            let inserted = child.insert(key, value, hs);
            self.cached = None;
            return inserted;
        }

        if let Entry::Leaf {
            key: existing,
            value: slot,
        } = &mut self.entries[pos]
        {
            if existing.as_slice() == key {
                *slot = value;
                self.cached = None;
                return false;
            }
        }

        // two distinct keys share the prefix so far: push the occupant one
        // level down next to the new leaf
        let consumed = hs.consumed;
        let occupant =
            std::mem::replace(&mut self.entries[pos], Entry::Branch(Node::default()));
        let (old_key, old_value) = match occupant {
            Entry::Leaf { key, value } => (key, value),
            Entry::Branch(_) => unreachable!(),
        };

        let mut branch = Node::default();
        branch.insert(&old_key, old_value, &mut HashState::forked(&old_key, consumed));
        branch.insert(key, value, &mut HashState::forked(key, consumed));

        self.entries[pos] = Entry::Branch(branch);
        self.cached = None;
        true
    }

    fn find(&self, key: &[u8]) -> Option<&V> {
        let mut hs = HashState::new(key);
        let mut current = self;

        loop {
            if hs.exhausted() {
                return current.find_fallback(key);
            }

            let idx = hs.next();
            if current.bitmap & (1 << idx) == 0 {
                return None;
            }

            let pos = count_ones_below(current.bitmap, idx);
            match &current.entries[pos] {
                Entry::Leaf { key: existing, value } => {
                    if existing.as_slice() == key {
                        return Some(value);
                    }
                    return None;
                }
                Entry::Branch(child) => current = child,
            }
        }
    }

    fn delete(&mut self, key: &[u8], hs: &mut HashState) -> bool {
        if hs.exhausted() {
            return self.delete_fallback(key);
        }

        let idx = hs.next();
        if self.bitmap & (1 << idx) == 0 {
            return false;
        }

        let pos = count_ones_below(self.bitmap, idx);

        match &mut self.entries[pos] {
            Entry::Leaf { key: existing, .. } => {
                if existing.as_slice() != key {
                    return false;
                }

                self.bitmap &= !(1 << idx);
                self.entries.remove(pos);
                self.cached = None;
                true
            }
            Entry::Branch(child) => {
                if !child.delete(key, hs) {
                    return false;
                }

                if child.entries.is_empty() {
                    self.bitmap &= !(1 << idx);
                    self.entries.remove(pos);
                } else if child.entries.len() == 1
                    && matches!(child.entries[0], Entry::Leaf { .. })
                {
                    // a lone leaf needs no branch of its own anymore
                    let leaf = child.entries.remove(0);
                    self.entries[pos] = leaf;
                }

                self.cached = None;
                true
            }
        }
    }

    // keys whose 256-bit hash is fully consumed land in a flat list that is
    // searched linearly
    fn insert_fallback(&mut self, key: &[u8], value: V) -> bool {
        for entry in self.entries.iter_mut() {
            if let Entry::Leaf {
                key: existing,
                value: slot,
            } = entry
            {
                if existing.as_slice() == key {
                    *slot = value;
                    self.cached = None;
                    return false;
                }
            }
        }

        self.entries.push(Entry::Leaf {
            key: key.to_vec(),
            value,
        });
        self.cached = None;
        true
    }

    fn find_fallback(&self, key: &[u8]) -> Option<&V> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Leaf {
                key: existing,
                value,
            } if existing.as_slice() == key => Some(value),
            _ => None,
        })
    }

    fn delete_fallback(&mut self, key: &[u8]) -> bool {
        let found = self.entries.iter().position(|entry| {
            matches!(entry, Entry::Leaf { key: existing, .. } if existing.as_slice() == key)
        });

        match found {
            Some(pos) => {
                self.entries.remove(pos);
                self.cached = None;
                true
            }
            None => false,
        }
    }

    fn for_each<F>(&self, f: &mut F) -> bool
    where
        F: FnMut(&[u8], &V) -> bool,
    {
        for entry in &self.entries {
            match entry {
                Entry::Leaf { key, value } => {
                    if !f(key, value) {
                        return false;
                    }
                }
                Entry::Branch(child) => {
                    if !child.for_each(f) {
                        return false;
                    }
                }
            }
        }

        true
    }

    fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Leaf { .. } => 1,
                Entry::Branch(child) => child.leaf_count(),
            })
            .sum()
    }
}

impl<V: minicbor::Encode<()>> Node<V> {
    fn hash(&mut self) -> Hash<32> {
        if let Some(cached) = self.cached {
            return cached;
        }

        let mut hasher = Hasher::<256>::new();
        for entry in self.entries.iter_mut() {
            match entry {
                Entry::Leaf { key, value } => {
                    hasher.input(key);
                    minicbor::encode(&*value, &mut hasher).expect("Infallible");
                }
                Entry::Branch(child) => {
                    hasher.input(child.hash().as_ref());
                }
            }
        }

        let digest = hasher.finalize();
        self.cached = Some(digest);
        digest
    }
}

/// Persistent map from byte keys to CBOR-encodable values committed by a
/// single 32-byte digest
///
/// Cloning produces a fully detached trie; the clone and the original can
/// diverge without observing each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trie<V> {
    root: Node<V>,
    size: usize,
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Trie {
            root: Node::default(),
            size: 0,
        }
    }
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value under `key`; returns whether the key
    /// was new
    pub fn insert(&mut self, key: impl Into<TrieKey>, value: V) -> bool {
        let key = key.into();
        let inserted = self.root.insert(&key, value, &mut HashState::new(&key));
        if inserted {
            self.size += 1;
        }
        inserted
    }

    pub fn get(&self, key: impl Into<TrieKey>) -> Option<&V> {
        let key = key.into();
        self.root.find(&key)
    }

    pub fn has(&self, key: impl Into<TrieKey>) -> bool {
        self.get(key).is_some()
    }

    /// Removes the value under `key`; returns whether the key was present
    pub fn delete(&mut self, key: impl Into<TrieKey>) -> bool {
        let key = key.into();
        let deleted = self.root.delete(&key, &mut HashState::new(&key));
        if deleted {
            self.size -= 1;
        }
        deleted
    }

    /// Visits every entry in the trie's canonical order until `f` returns
    /// false; returns whether the walk ran to completion
    pub fn for_each<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&[u8], &V) -> bool,
    {
        self.root.for_each(&mut f)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl<V: minicbor::Encode<()>> Trie<V> {
    /// The content commitment of the whole map
    ///
    /// Memoised per node; computing the hash twice in a row walks no nodes
    /// the second time.
    pub fn hash(&mut self) -> Hash<32> {
        self.root.hash()
    }
}

impl<C, V: minicbor::Encode<C>> minicbor::Encode<C> for Entry<V> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(3)?;

        match self {
            Entry::Leaf { key, value } => {
                e.bytes(key)?;
                e.encode_with(value, ctx)?;
                e.null()?;
            }
            Entry::Branch(child) => {
                e.null()?;
                e.null()?;
                e.encode_with(child, ctx)?;
            }
        }

        Ok(())
    }
}

impl<'b, C, V: minicbor::Decode<'b, C>> minicbor::Decode<'b, C> for Entry<V> {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = d.array()?;
        if len != Some(3) {
            return Err(minicbor::decode::Error::message(
                "trie entry must be a 3-element array",
            ));
        }

        match d.datatype()? {
            minicbor::data::Type::Bytes => {
                let key = d.bytes()?.to_vec();
                let value = d.decode_with(ctx)?;
                d.skip()?;
                Ok(Entry::Leaf { key, value })
            }
            minicbor::data::Type::Null => {
                d.skip()?;
                d.skip()?;
                let child = d.decode_with(ctx)?;
                Ok(Entry::Branch(child))
            }
            _ => Err(minicbor::decode::Error::message(
                "trie entry must start with a key or nil",
            )),
        }
    }
}

impl<C, V: minicbor::Encode<C>> minicbor::Encode<C> for Node<V> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.u64(self.bitmap)?;
        e.array(self.entries.len() as u64)?;

        for entry in &self.entries {
            e.encode_with(entry, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C, V: minicbor::Decode<'b, C>> minicbor::Decode<'b, C> for Node<V> {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = d.array()?;
        if len != Some(2) {
            return Err(minicbor::decode::Error::message(
                "trie node must be a 2-element array",
            ));
        }

        let bitmap = d.u64()?;

        let entries_len = d
            .array()?
            .ok_or_else(|| minicbor::decode::Error::message("indefinite-length entry array"))?;

        let entries: Result<Vec<Entry<V>>, _> =
            (0..entries_len).map(|_| d.decode_with(ctx)).collect();

        Ok(Node {
            bitmap,
            entries: entries?,
            cached: None,
        })
    }
}

impl<C, V: minicbor::Encode<C>> minicbor::Encode<C> for Trie<V> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        // only the root node travels; size is recomputed on decode and hash
        // caches never serialise
        e.encode_with(&self.root, ctx)?;

        Ok(())
    }
}

impl<'b, C, V: minicbor::Decode<'b, C>> minicbor::Decode<'b, C> for Trie<V> {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let root: Node<V> = d.decode_with(ctx)?;
        let size = root.leaf_count();

        Ok(Trie { root, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_trie_hash() {
        let mut trie: Trie<String> = Trie::new();
        assert_eq!(trie.hash().to_string(), EMPTY_HASH);
    }

    #[test]
    fn basic_operations() {
        let mut trie = Trie::new();
        trie.insert("name", "Alice".to_string());
        let mut copy = trie.clone();

        copy.insert("age", "Bob".to_string());
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get("name"), Some(&"Alice".to_string()));
        assert_eq!(copy.get("age"), Some(&"Bob".to_string()));

        // original trie is unaffected by the copy's mutation
        assert_eq!(trie.get("age"), None);
        assert_eq!(trie.len(), 1);
        assert!(!trie.has("age"));
    }

    #[test]
    fn overwrite_and_delete_track_size() {
        let mut trie = Trie::new();
        for (k, v) in [("a", 0u64), ("b", 1), ("c", 2), ("d", 3)] {
            assert!(trie.insert(k, v));
        }
        assert_eq!(trie.len(), 4);

        // replacing is not an insert
        assert!(!trie.insert("b", 100));
        assert_eq!(trie.len(), 4);
        assert_eq!(trie.get("b"), Some(&100));

        assert!(trie.delete("a"));
        assert!(!trie.delete("a"));
        assert_eq!(trie.len(), 3);
        assert_eq!(trie.get("a"), None);
    }

    #[test]
    fn overwrite_invalidates_cached_hashes() {
        let mut trie = Trie::new();
        for i in 0u64..20 {
            trie.insert(i, i);
        }

        let before = trie.hash();
        trie.insert(7u64, 700);
        assert_ne!(trie.hash(), before);

        trie.insert(7u64, 7);
        assert_eq!(trie.hash(), before);
    }

    #[test]
    fn known_root_for_string_keys() {
        let mut trie = Trie::new();
        trie.insert("name", "Alice".to_string());
        trie.insert("age", "Bob".to_string());

        assert_eq!(
            trie.hash().to_string(),
            "24d240fb4aed86f5db9198cc0f1dfb9834a9170c735e7c46d587977cfea8ec81"
        );
    }

    #[test]
    fn insertion_order_does_not_change_hash() {
        // all 24 permutations of four entries end in one root
        let entries: [(u64, &str); 4] = [(0, "a"), (1, "b"), (2, "c"), (3, "d")];
        let expected = "db69190e93407c993f4728b76404f780b5c35b5198561b4c0a445754f424f5f0";

        let mut permutation = [0usize, 1, 2, 3];
        let mut seen = 0;
        permute(&mut permutation, 0, &mut |order| {
            let mut trie = Trie::new();
            for &i in order {
                let (k, v) = entries[i];
                trie.insert(k, v.to_string());
            }
            assert_eq!(trie.hash().to_string(), expected);
            seen += 1;
        });
        assert_eq!(seen, 24);
    }

    fn permute(items: &mut [usize; 4], k: usize, visit: &mut impl FnMut(&[usize; 4])) {
        if k == items.len() {
            visit(items);
            return;
        }
        for i in k..items.len() {
            items.swap(k, i);
            permute(items, k + 1, visit);
            items.swap(k, i);
        }
    }

    #[test]
    fn deletion_restores_fresh_build() {
        let mut built = Trie::new();
        for i in 0u64..100 {
            built.insert(i, i * 2);
        }
        assert_eq!(
            built.hash().to_string(),
            "d4865b238beda312e68613e11befd9f50cae9d8add1f2f15e75519d374110312"
        );

        for i in (1u64..100).step_by(2) {
            assert!(built.delete(i));
        }
        assert_eq!(built.len(), 50);

        let mut fresh = Trie::new();
        for i in (0u64..100).step_by(2) {
            fresh.insert(i, i * 2);
        }

        assert_eq!(built.hash(), fresh.hash());
        assert_eq!(
            built.hash().to_string(),
            "cb52bd2e7122cff47c84b571ac79fcf109ef181a1477b56fc2e740c6c2f73b88"
        );
        assert_eq!(built, fresh);
    }

    #[test]
    fn clone_is_detached() {
        let mut original = Trie::new();
        for i in 0u64..32 {
            original.insert(i, i);
        }
        let baseline = original.hash();

        let mut copy = original.clone();
        copy.insert(100u64, 100);
        copy.delete(0u64);

        assert_eq!(original.hash(), baseline);
        assert_eq!(original.len(), 32);
        assert_eq!(copy.len(), 32);
        assert_ne!(copy.hash(), baseline);
    }

    #[test]
    fn iteration_is_deterministic_with_early_stop() {
        let mut trie = Trie::new();
        for i in 0u64..50 {
            trie.insert(i, i);
        }

        let mut first = Vec::new();
        assert!(trie.for_each(|k, _| {
            first.push(k.to_vec());
            true
        }));
        assert_eq!(first.len(), 50);

        let mut second = Vec::new();
        assert!(!trie.for_each(|k, _| {
            second.push(k.to_vec());
            second.len() < 10
        }));
        assert_eq!(second, first[..10].to_vec());
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut trie = Trie::new();
        for (k, v) in [(0u64, "a"), (1, "b"), (2, "c"), (3, "d")] {
            trie.insert(k, v.to_string());
        }

        let bytes = minicbor::to_vec(&trie).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "821b002808000000000083834800000000000000006161f683f6f6821a0005000082834800000000000000026163f6834800000000000000016162f6834800000000000000036164f6"
        );

        let mut decoded: Trie<String> = minicbor::decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.get(2u64), Some(&"c".to_string()));
        assert_eq!(decoded.hash(), trie.hash());
        assert_eq!(decoded, trie);
    }

    #[test]
    fn model_check_against_btreemap() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        use std::collections::BTreeMap;

        let mut rng = StdRng::seed_from_u64(0xba2aa);
        let mut trie = Trie::new();
        let mut model: BTreeMap<u64, u64> = BTreeMap::new();

        for _ in 0..2000 {
            let key = rng.gen_range(0u64..300);
            if rng.gen_bool(0.3) {
                assert_eq!(trie.delete(key), model.remove(&key).is_some());
            } else {
                let value = rng.gen::<u64>();
                assert_eq!(trie.insert(key, value), model.insert(key, value).is_none());
            }
            assert_eq!(trie.len(), model.len());
        }

        for (key, value) in &model {
            assert_eq!(trie.get(*key), Some(value));
        }
    }

    mod generated {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        #[derive(Debug, Clone)]
        enum MapOp {
            Insert(u16, u64),
            Delete(u16),
        }

        fn ops() -> impl Strategy<Value = Vec<MapOp>> {
            proptest::collection::vec(
                prop_oneof![
                    (any::<u16>(), any::<u64>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
                    any::<u16>().prop_map(MapOp::Delete),
                ],
                0..200,
            )
        }

        proptest! {
            #[test]
            fn behaves_like_a_map(ops in ops()) {
                let mut trie = Trie::new();
                let mut model: BTreeMap<u64, u64> = BTreeMap::new();

                for op in ops {
                    match op {
                        MapOp::Insert(k, v) => {
                            prop_assert_eq!(
                                trie.insert(k as u64, v),
                                model.insert(k as u64, v).is_none()
                            );
                        }
                        MapOp::Delete(k) => {
                            prop_assert_eq!(trie.delete(k as u64), model.remove(&(k as u64)).is_some());
                        }
                    }
                    prop_assert_eq!(trie.len(), model.len());
                }

                for (k, v) in &model {
                    prop_assert_eq!(trie.get(*k), Some(v));
                }

                // the surviving entries alone determine the commitment
                let mut fresh = Trie::new();
                for (k, v) in &model {
                    fresh.insert(*k, *v);
                }
                prop_assert_eq!(trie.hash(), fresh.hash());
            }
        }
    }

    #[test]
    fn shuffled_builds_share_one_hash() {
        use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

        let entries: Vec<(u64, u64)> = (0..64).map(|i| (i, i * i)).collect();

        let mut reference = Trie::new();
        for (k, v) in &entries {
            reference.insert(*k, *v);
        }
        let expected = reference.hash();

        for seed in 0u64..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut shuffled = entries.clone();
            shuffled.shuffle(&mut rng);

            let mut trie = Trie::new();
            for (k, v) in shuffled {
                trie.insert(k, v);
            }
            assert_eq!(trie.hash(), expected);
        }
    }
}
