//! The shop aggregate and its root commitment

use bazaar_codec::minicbor;
use bazaar_codec::utils::check_key_order;
use bazaar_crypto::hash::{Hash, Hasher};
use bazaar_hamt::Trie;
use bazaar_primitives::{Account, Listing, Manifest, Order, Tag};

/// A shop: the manifest plus the five state maps
///
/// The aggregate's [`Shop::hash`] is the single commitment replicated
/// between clients: the manifest is committed structurally while each trie
/// contributes only its 32-byte root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shop {
    pub schema_version: u64,
    pub manifest: Manifest,
    pub accounts: Trie<Account>,
    pub listings: Trie<Listing>,
    pub inventory: Trie<u64>,
    pub tags: Trie<Tag>,
    pub orders: Trie<Order>,
}

impl Shop {
    pub fn new(schema_version: u64, manifest: Manifest) -> Self {
        Shop {
            schema_version,
            manifest,
            accounts: Trie::new(),
            listings: Trie::new(),
            inventory: Trie::new(),
            tags: Trie::new(),
            orders: Trie::new(),
        }
    }

    /// The 32-byte commitment of the whole shop state
    pub fn hash(&mut self) -> Hash<32> {
        let commitment = Commitment {
            schema_version: self.schema_version,
            manifest: &self.manifest,
            accounts: self.accounts.hash(),
            listings: self.listings.hash(),
            inventory: self.inventory.hash(),
            tags: self.tags.hash(),
            orders: self.orders.hash(),
        };

        Hasher::<256>::hash_cbor(&commitment)
    }
}

/// The hashed form of the shop: sub-trees are flattened to their roots
struct Commitment<'a> {
    schema_version: u64,
    manifest: &'a Manifest,
    accounts: Hash<32>,
    listings: Hash<32>,
    inventory: Hash<32>,
    tags: Hash<32>,
    orders: Hash<32>,
}

impl<C> minicbor::Encode<C> for Commitment<'_> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(7)?;
        e.str("Tags")?;
        e.encode_with(self.tags, ctx)?;
        e.str("Orders")?;
        e.encode_with(self.orders, ctx)?;
        e.str("Accounts")?;
        e.encode_with(self.accounts, ctx)?;
        e.str("Listings")?;
        e.encode_with(self.listings, ctx)?;
        e.str("Manifest")?;
        e.encode_with(self.manifest, ctx)?;
        e.str("Inventory")?;
        e.encode_with(self.inventory, ctx)?;
        e.str("SchemaVersion")?;
        e.u64(self.schema_version)?;

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for Shop {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(7)?;
        e.str("Tags")?;
        e.encode_with(&self.tags, ctx)?;
        e.str("Orders")?;
        e.encode_with(&self.orders, ctx)?;
        e.str("Accounts")?;
        e.encode_with(&self.accounts, ctx)?;
        e.str("Listings")?;
        e.encode_with(&self.listings, ctx)?;
        e.str("Manifest")?;
        e.encode_with(&self.manifest, ctx)?;
        e.str("Inventory")?;
        e.encode_with(&self.inventory, ctx)?;
        e.str("SchemaVersion")?;
        e.u64(self.schema_version)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Shop {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = d
            .map()?
            .ok_or_else(|| minicbor::decode::Error::message("indefinite-length map"))?;

        let mut schema_version = None;
        let mut manifest = None;
        let mut accounts = None;
        let mut listings = None;
        let mut inventory = None;
        let mut tags = None;
        let mut orders = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Tags" => tags = Some(d.decode_with(ctx)?),
                "Orders" => orders = Some(d.decode_with(ctx)?),
                "Accounts" => accounts = Some(d.decode_with(ctx)?),
                "Listings" => listings = Some(d.decode_with(ctx)?),
                "Manifest" => manifest = Some(d.decode_with(ctx)?),
                "Inventory" => inventory = Some(d.decode_with(ctx)?),
                "SchemaVersion" => schema_version = Some(d.u64()?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Shop field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Shop {
            schema_version: schema_version
                .ok_or_else(|| minicbor::decode::Error::message("missing required field SchemaVersion"))?,
            manifest: manifest
                .ok_or_else(|| minicbor::decode::Error::message("missing required field Manifest"))?,
            accounts: accounts
                .ok_or_else(|| minicbor::decode::Error::message("missing required field Accounts"))?,
            listings: listings
                .ok_or_else(|| minicbor::decode::Error::message("missing required field Listings"))?,
            inventory: inventory
                .ok_or_else(|| minicbor::decode::Error::message("missing required field Inventory"))?,
            tags: tags
                .ok_or_else(|| minicbor::decode::Error::message("missing required field Tags"))?,
            orders: orders
                .ok_or_else(|| minicbor::decode::Error::message("missing required field Orders"))?,
        })
    }
}
