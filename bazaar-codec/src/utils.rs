use minicbor::{decode::Error, Decode, Encode};
use std::{cmp::Ordering, ops::Deref};

/// Compares two encoded CBOR keys in canonical order
///
/// The deterministic encoding sorts map keys by the length of their encoded
/// form first and bytewise-lexicographically second. For the keys used by
/// this protocol (short text strings, minimally-encoded uints and
/// fixed-length byte strings) this coincides with plain bytewise order of
/// the encoded keys.
pub fn canonical_key_order(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Encodes a single map key so it can be compared canonically
pub fn encoded_key<K>(key: &K) -> Vec<u8>
where
    K: Encode<()>,
{
    minicbor::to_vec(key).expect("Infallible")
}

/// Checks that a decoded text key follows its predecessor in canonical order
///
/// Used by the hand-written struct decoders to reject maps whose keys are
/// out of order or duplicated.
pub fn check_key_order(prev: Option<&str>, next: &str) -> Result<(), Error> {
    if let Some(prev) = prev {
        let ord = prev
            .len()
            .cmp(&next.len())
            .then_with(|| prev.as_bytes().cmp(next.as_bytes()));

        if ord != Ordering::Less {
            return Err(Error::message(format!(
                "map keys out of canonical order: {prev:?} before {next:?}"
            )));
        }
    }

    Ok(())
}

/// Custom collection to ensure canonically ordered pairs of values
///
/// The deterministic encoding requires map entries to be sorted by their
/// encoded keys, so we use a Vec that is sorted on construction as the
/// underlaying struct for storage of the items (as opposed to a BTreeMap
/// or HashMap, whose ordering would follow the key type instead of the
/// encoded bytes).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyValuePairs<K, V>(Vec<(K, V)>);

impl<K, V> KeyValuePairs<K, V> {
    pub fn to_vec(self) -> Vec<(K, V)> {
        self.0
    }

    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: PartialEq,
    {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<K, V> Default for KeyValuePairs<K, V> {
    fn default() -> Self {
        KeyValuePairs(Vec::new())
    }
}

impl<K, V> From<KeyValuePairs<K, V>> for Vec<(K, V)> {
    fn from(other: KeyValuePairs<K, V>) -> Self {
        other.0
    }
}

impl<K, V> From<Vec<(K, V)>> for KeyValuePairs<K, V>
where
    K: Encode<()>,
{
    fn from(mut other: Vec<(K, V)>) -> Self {
        other.sort_by(|(a, _), (b, _)| canonical_key_order(&encoded_key(a), &encoded_key(b)));
        KeyValuePairs(other)
    }
}

impl<K, V> Deref for KeyValuePairs<K, V> {
    type Target = Vec<(K, V)>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'b, C, K, V> minicbor::decode::Decode<'b, C> for KeyValuePairs<K, V>
where
    K: Decode<'b, C> + Encode<()>,
    V: Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        if d.datatype()? != minicbor::data::Type::Map {
            return Err(Error::message("invalid data type for keyvaluepairs"));
        }

        let items: Result<Vec<_>, _> = d.map_iter_with::<C, K, V>(ctx)?.collect();
        let items = items?;

        let mut prev: Option<Vec<u8>> = None;
        for (k, _) in items.iter() {
            let next = encoded_key(k);
            if let Some(prev) = prev {
                if canonical_key_order(&prev, &next) != Ordering::Less {
                    return Err(Error::message("map keys out of canonical order"));
                }
            }
            prev = Some(next);
        }

        Ok(KeyValuePairs(items))
    }
}

impl<C, K, V> minicbor::encode::Encode<C> for KeyValuePairs<K, V>
where
    K: Encode<C>,
    V: Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(self.0.len() as u64)?;

        for (k, v) in self.0.iter() {
            k.encode(e, ctx)?;
            v.encode(e, ctx)?;
        }

        Ok(())
    }
}

/// Custom collection to ensure canonically ordered pairs of values (non-empty)
///
/// The optional maps of the protocol are omitted entirely when they carry no
/// entries, so a present map is never empty. Construction and decoding both
/// reject the empty case.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyKeyValuePairs<K, V>(Vec<(K, V)>);

impl<K, V> NonEmptyKeyValuePairs<K, V> {
    pub fn to_vec(self) -> Vec<(K, V)> {
        self.0
    }

    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: PartialEq,
    {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<K, V> From<NonEmptyKeyValuePairs<K, V>> for Vec<(K, V)> {
    fn from(other: NonEmptyKeyValuePairs<K, V>) -> Self {
        other.0
    }
}

impl<K, V> TryFrom<Vec<(K, V)>> for NonEmptyKeyValuePairs<K, V>
where
    K: Encode<()>,
{
    type Error = String;

    fn try_from(mut value: Vec<(K, V)>) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err("NonEmptyKeyValuePairs must contain at least one element".into())
        } else {
            value.sort_by(|(a, _), (b, _)| canonical_key_order(&encoded_key(a), &encoded_key(b)));
            Ok(NonEmptyKeyValuePairs(value))
        }
    }
}

impl<K, V> Deref for NonEmptyKeyValuePairs<K, V> {
    type Target = Vec<(K, V)>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'b, C, K, V> minicbor::decode::Decode<'b, C> for NonEmptyKeyValuePairs<K, V>
where
    K: Decode<'b, C> + Encode<()>,
    V: Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let pairs = KeyValuePairs::<K, V>::decode(d, ctx)?;

        if pairs.is_empty() {
            return Err(Error::message(
                "decoding empty map as NonEmptyKeyValuePairs",
            ));
        }

        Ok(NonEmptyKeyValuePairs(pairs.to_vec()))
    }
}

impl<C, K, V> minicbor::encode::Encode<C> for NonEmptyKeyValuePairs<K, V>
where
    K: Encode<C>,
    V: Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(self.0.len() as u64)?;

        for (k, v) in self.0.iter() {
            k.encode(e, ctx)?;
            v.encode(e, ctx)?;
        }

        Ok(())
    }
}

/// An empty map
///
/// Used as the value side of set-like maps on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmptyMap;

impl<'b, C> minicbor::decode::Decode<'b, C> for EmptyMap {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        match d.map()? {
            Some(0) => Ok(EmptyMap),
            _ => Err(Error::message("expected empty definite-length map")),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for EmptyMap {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(0)?;

        Ok(())
    }
}

/// Set
///
/// Represented on the wire as a map from element to an empty map, with the
/// elements in canonical key order and no duplicates.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Set<T>(Vec<T>);

impl<T> Set<T> {
    pub fn to_vec(self) -> Vec<T> {
        self.0
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.0.contains(item)
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Set(Vec::new())
    }
}

impl<T> Deref for Set<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> From<Vec<T>> for Set<T>
where
    T: Encode<()>,
{
    fn from(mut value: Vec<T>) -> Self {
        value.sort_by(|a, b| canonical_key_order(&encoded_key(a), &encoded_key(b)));
        Set(value)
    }
}

impl<'a, T> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'b, C, T> minicbor::decode::Decode<'b, C> for Set<T>
where
    T: Decode<'b, C> + Encode<()>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let pairs = KeyValuePairs::<T, EmptyMap>::decode(d, ctx)?;
        let items = pairs.to_vec().into_iter().map(|(k, _)| k).collect();

        Ok(Set(items))
    }
}

impl<C, T> minicbor::encode::Encode<C> for Set<T>
where
    T: Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(self.0.len() as u64)?;

        for item in self.0.iter() {
            item.encode(e, ctx)?;
            e.map(0)?;
        }

        Ok(())
    }
}
