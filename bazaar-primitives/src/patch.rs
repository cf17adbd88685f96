//! Patches: the signed mutations replicated between shop clients

use bazaar_codec::minicbor::{self, data::Type};
use bazaar_codec::utils::check_key_order;
use bazaar_codec::value::Value;
use bazaar_crypto::hash::Hash;
use bazaar_crypto::key::secp256k1::Signature;

use crate::base::{EthereumAddress, Timestamp, Uint256};
use crate::{decode_err, definite_array, definite_map, missing, ValidationError};

/// The kind of object a patch addresses, the first element of every path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    SchemaVersion,
    Manifest,
    Accounts,
    Listings,
    Orders,
    Tags,
    Inventory,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::SchemaVersion => "SchemaVersion",
            ObjectType::Manifest => "Manifest",
            ObjectType::Accounts => "Accounts",
            ObjectType::Listings => "Listings",
            ObjectType::Orders => "Orders",
            ObjectType::Tags => "Tags",
            ObjectType::Inventory => "Inventory",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "SchemaVersion" => Ok(ObjectType::SchemaVersion),
            "Manifest" => Ok(ObjectType::Manifest),
            "Accounts" => Ok(ObjectType::Accounts),
            "Listings" => Ok(ObjectType::Listings),
            "Orders" => Ok(ObjectType::Orders),
            "Tags" => Ok(ObjectType::Tags),
            "Inventory" => Ok(ObjectType::Inventory),
            _ => Err(ValidationError::InvalidField("Path", "unknown object type")),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<C> minicbor::Encode<C> for ObjectType {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(self.as_str())?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ObjectType {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        ObjectType::parse(d.str()?).map_err(decode_err)
    }
}

/// Mutation verb of a patch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Append,
    Replace,
    Remove,
    Increment,
    Decrement,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Append => "append",
            Op::Replace => "replace",
            Op::Remove => "remove",
            Op::Increment => "increment",
            Op::Decrement => "decrement",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "add" => Ok(Op::Add),
            "append" => Ok(Op::Append),
            "replace" => Ok(Op::Replace),
            "remove" => Ok(Op::Remove),
            "increment" => Ok(Op::Increment),
            "decrement" => Ok(Op::Decrement),
            _ => Err(ValidationError::InvalidField("Op", "unknown operation")),
        }
    }
}

impl<C> minicbor::Encode<C> for Op {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(self.as_str())?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Op {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        Op::parse(d.str()?).map_err(decode_err)
    }
}

/// A trailing path element: a field name or an array index
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Index(u64),
    Key(String),
}

bazaar_codec::codec_by_datatype! {
    PathSegment,
    U8 | U16 | U32 | U64 => Index,
    String => Key,
}

impl From<u64> for PathSegment {
    fn from(value: u64) -> Self {
        PathSegment::Index(value)
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_owned())
    }
}

/// An ordered, typed path selecting the object (and optionally the field)
/// a patch applies to
///
/// The leading object type dictates the identifier: manifest-level objects
/// take none, accounts an address, listings, orders and inventory a numeric
/// id, tags a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchPath {
    pub object_type: ObjectType,
    pub object_id: Option<u64>,
    pub account_addr: Option<EthereumAddress>,
    pub tag_name: Option<String>,
    pub fields: Vec<PathSegment>,
}

impl PatchPath {
    pub fn schema_version() -> Self {
        PatchPath {
            object_type: ObjectType::SchemaVersion,
            object_id: None,
            account_addr: None,
            tag_name: None,
            fields: Vec::new(),
        }
    }

    pub fn manifest(fields: Vec<PathSegment>) -> Self {
        PatchPath {
            object_type: ObjectType::Manifest,
            object_id: None,
            account_addr: None,
            tag_name: None,
            fields,
        }
    }

    pub fn account(address: EthereumAddress, fields: Vec<PathSegment>) -> Self {
        PatchPath {
            object_type: ObjectType::Accounts,
            object_id: None,
            account_addr: Some(address),
            tag_name: None,
            fields,
        }
    }

    pub fn listing(id: u64, fields: Vec<PathSegment>) -> Self {
        PatchPath {
            object_type: ObjectType::Listings,
            object_id: Some(id),
            account_addr: None,
            tag_name: None,
            fields,
        }
    }

    pub fn order(id: u64, fields: Vec<PathSegment>) -> Self {
        PatchPath {
            object_type: ObjectType::Orders,
            object_id: Some(id),
            account_addr: None,
            tag_name: None,
            fields,
        }
    }

    pub fn inventory(id: u64, fields: Vec<PathSegment>) -> Self {
        PatchPath {
            object_type: ObjectType::Inventory,
            object_id: Some(id),
            account_addr: None,
            tag_name: None,
            fields,
        }
    }

    pub fn tag(name: impl Into<String>, fields: Vec<PathSegment>) -> Self {
        PatchPath {
            object_type: ObjectType::Tags,
            object_id: None,
            account_addr: None,
            tag_name: Some(name.into()),
            fields,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let ids = (
            self.object_id.is_some(),
            self.account_addr.is_some(),
            self.tag_name.is_some(),
        );

        match self.object_type {
            ObjectType::Manifest | ObjectType::SchemaVersion => {
                if ids != (false, false, false) {
                    return Err(ValidationError::InvalidState(
                        "manifest-level patch takes no id",
                    ));
                }
            }
            ObjectType::Accounts => {
                if ids != (false, true, false) {
                    return Err(ValidationError::InvalidState(
                        "account patch takes exactly an address id",
                    ));
                }
            }
            ObjectType::Listings | ObjectType::Orders | ObjectType::Inventory => {
                if ids != (true, false, false) {
                    return Err(ValidationError::InvalidState(
                        "listing, order and inventory patches take exactly a numeric id",
                    ));
                }
            }
            ObjectType::Tags => {
                if ids != (false, false, true) {
                    return Err(ValidationError::InvalidState(
                        "tag patch takes exactly a tag name",
                    ));
                }
                if self.tag_name.as_deref() == Some("") {
                    return Err(ValidationError::EmptyContainer("tag name"));
                }
            }
        }

        Ok(())
    }

    fn id_element_count(&self) -> u64 {
        match self.object_type {
            ObjectType::Manifest | ObjectType::SchemaVersion => 0,
            _ => 1,
        }
    }
}

impl<C> minicbor::Encode<C> for PatchPath {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.array(1 + self.id_element_count() + self.fields.len() as u64)?;
        e.encode_with(self.object_type, ctx)?;

        match self.object_type {
            ObjectType::Manifest | ObjectType::SchemaVersion => {}
            ObjectType::Accounts => {
                e.encode_with(self.account_addr.expect("validated"), ctx)?;
            }
            ObjectType::Listings | ObjectType::Orders | ObjectType::Inventory => {
                e.u64(self.object_id.expect("validated"))?;
            }
            ObjectType::Tags => {
                e.str(self.tag_name.as_deref().expect("validated"))?;
            }
        }

        for field in &self.fields {
            e.encode_with(field, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PatchPath {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_array(d)?;
        if len == 0 {
            return Err(minicbor::decode::Error::message("empty patch path"));
        }

        let object_type: ObjectType = d.decode_with(ctx)?;

        let mut object_id = None;
        let mut account_addr = None;
        let mut tag_name = None;
        let mut remaining = len - 1;

        match object_type {
            ObjectType::Manifest | ObjectType::SchemaVersion => {}
            _ => {
                if remaining == 0 {
                    return Err(decode_err(ValidationError::MissingRequired("path id")));
                }

                match object_type {
                    ObjectType::Accounts => {
                        account_addr = Some(d.decode_with(ctx)?);
                    }
                    ObjectType::Listings | ObjectType::Orders | ObjectType::Inventory => {
                        if !matches!(
                            d.datatype()?,
                            Type::U8 | Type::U16 | Type::U32 | Type::U64
                        ) {
                            return Err(minicbor::decode::Error::message(
                                "path id must be an unsigned integer",
                            ));
                        }
                        object_id = Some(d.u64()?);
                    }
                    ObjectType::Tags => {
                        tag_name = Some(d.str()?.to_owned());
                    }
                    _ => unreachable!(),
                }

                remaining -= 1;
            }
        }

        let fields: Result<Vec<PathSegment>, _> =
            (0..remaining).map(|_| d.decode_with(ctx)).collect();

        let path = PatchPath {
            object_type,
            object_id,
            account_addr,
            tag_name,
            fields: fields?,
        };
        path.validate().map_err(decode_err)?;
        Ok(path)
    }
}

/// A single mutation: verb, path and an opaque CBOR value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    pub op: Op,
    pub path: PatchPath,
    pub value: Value,
}

impl<C> minicbor::Encode<C> for Patch {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(3)?;
        e.str("Op")?;
        e.encode_with(self.op, ctx)?;
        e.str("Path")?;
        e.encode_with(&self.path, ctx)?;
        e.str("Value")?;
        e.encode_with(&self.value, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Patch {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut op = None;
        let mut path = None;
        let mut value = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Op" => op = Some(d.decode_with(ctx)?),
                "Path" => path = Some(d.decode_with(ctx)?),
                "Value" => value = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Patch field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Patch {
            op: op.ok_or_else(|| missing("Op"))?,
            path: path.ok_or_else(|| missing("Path"))?,
            value: value.ok_or_else(|| missing("Value"))?,
        })
    }
}

/// Header binding a patch set to a shop, a key card nonce and the root of
/// its patch log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchSetHeader {
    pub key_card_nonce: u64,
    pub shop_id: Uint256,
    pub timestamp: Timestamp,
    pub root_hash: Hash<32>,
}

impl PatchSetHeader {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_card_nonce == 0 {
            return Err(ValidationError::OutOfRange("KeyCardNonce"));
        }

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for PatchSetHeader {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(4)?;
        e.str("ShopID")?;
        e.encode_with(self.shop_id, ctx)?;
        e.str("RootHash")?;
        e.encode_with(self.root_hash, ctx)?;
        e.str("Timestamp")?;
        e.encode_with(self.timestamp, ctx)?;
        e.str("KeyCardNonce")?;
        e.u64(self.key_card_nonce)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PatchSetHeader {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut key_card_nonce = None;
        let mut shop_id = None;
        let mut timestamp = None;
        let mut root_hash = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "ShopID" => shop_id = Some(d.decode_with(ctx)?),
                "RootHash" => root_hash = Some(d.decode_with(ctx)?),
                "Timestamp" => timestamp = Some(d.decode_with(ctx)?),
                "KeyCardNonce" => key_card_nonce = Some(d.u64()?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown PatchSetHeader field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let header = PatchSetHeader {
            key_card_nonce: key_card_nonce.ok_or_else(|| missing("KeyCardNonce"))?,
            shop_id: shop_id.ok_or_else(|| missing("ShopID"))?,
            timestamp: timestamp.ok_or_else(|| missing("Timestamp"))?,
            root_hash: root_hash.ok_or_else(|| missing("RootHash"))?,
        };
        header.validate().map_err(decode_err)?;
        Ok(header)
    }
}

/// A patch set together with the signature authorising it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPatchSet {
    pub header: PatchSetHeader,
    pub signature: Signature,
    pub patches: Vec<Patch>,
}

impl SignedPatchSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.header.validate()?;

        if self.patches.is_empty() {
            return Err(ValidationError::EmptyContainer("Patches"));
        }

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for SignedPatchSet {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(3)?;
        e.str("Header")?;
        e.encode_with(self.header, ctx)?;
        e.str("Patches")?;
        e.array(self.patches.len() as u64)?;
        for patch in &self.patches {
            e.encode_with(patch, ctx)?;
        }
        e.str("Signature")?;
        e.encode_with(self.signature, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for SignedPatchSet {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut header = None;
        let mut signature = None;
        let mut patches = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Header" => header = Some(d.decode_with(ctx)?),
                "Patches" => {
                    let count = definite_array(d)?;
                    let decoded: Result<Vec<Patch>, _> =
                        (0..count).map(|_| d.decode_with(ctx)).collect();
                    patches = Some(decoded?);
                }
                "Signature" => signature = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown SignedPatchSet field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let set = SignedPatchSet {
            header: header.ok_or_else(|| missing("Header"))?,
            signature: signature.ok_or_else(|| missing("Signature"))?,
            patches: patches.ok_or_else(|| missing("Patches"))?,
        };
        set.validate().map_err(decode_err)?;
        Ok(set)
    }
}
