//! Scalar and small composite types shared across the schema

use bazaar_codec::minicbor::{
    self,
    data::{Tag as CborTag, Type},
};
use bazaar_codec::utils::check_key_order;
use bazaar_crypto::hash::Hash;
use bazaar_crypto::key::secp256k1::PublicKey;
use chrono::{DateTime, SecondsFormat, Utc};
use std::{fmt, str::FromStr};

use crate::{decode_err, definite_array, definite_map, missing, ValidationError};

/// Unsigned 256-bit integer, stored big-endian
///
/// Encodes as a plain CBOR uint while the value fits 64 bits and as a
/// positive bignum (tag 2) with minimal magnitude bytes beyond that, exactly
/// the split the canonical encoder mandates.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint256([u8; 32]);

impl Uint256 {
    pub const ZERO: Self = Uint256([0; 32]);
    pub const MAX: Self = Uint256([0xff; 32]);

    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Uint256(bytes)
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }

    /// the big-endian magnitude without leading zeroes; empty for zero
    pub fn magnitude(&self) -> &[u8] {
        let start = self.0.iter().position(|b| *b != 0).unwrap_or(32);
        &self.0[start..]
    }

    pub fn as_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }

        Some(u64::from_be_bytes(self.0[24..].try_into().expect("8 bytes")))
    }
}

impl From<u64> for Uint256 {
    fn from(value: u64) -> Self {
        let mut bytes = [0; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Uint256(bytes)
    }
}

impl TryFrom<&[u8]> for Uint256 {
    type Error = ValidationError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() > 32 {
            return Err(ValidationError::OutOfRange("Uint256"));
        }

        let mut bytes = [0; 32];
        bytes[32 - value.len()..].copy_from_slice(value);
        Ok(Uint256(bytes))
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({self})")
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.magnitude();
        if magnitude.is_empty() {
            f.write_str("0x0")
        } else {
            write!(f, "0x{}", hex::encode(magnitude))
        }
    }
}

impl FromStr for Uint256 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(ValidationError::InvalidField("Uint256", "empty hex string"));
        }

        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_owned()
        };

        let bytes = hex::decode(padded)
            .map_err(|_| ValidationError::InvalidField("Uint256", "invalid hex string"))?;
        Uint256::try_from(bytes.as_slice())
    }
}

impl<C> minicbor::Encode<C> for Uint256 {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self.as_u64() {
            Some(small) => {
                e.u64(small)?;
            }
            None => {
                e.tag(CborTag::PosBignum)?;
                e.bytes(self.magnitude())?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Uint256 {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        match d.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => Ok(Uint256::from(d.u64()?)),
            Type::Tag => {
                if d.tag()? != CborTag::PosBignum {
                    return Err(minicbor::decode::Error::message(
                        "expected positive bignum tag",
                    ));
                }

                let bytes = d.bytes()?;
                if bytes.len() > 32 {
                    return Err(decode_err(ValidationError::OutOfRange("Uint256")));
                }
                if bytes.len() <= 8 || bytes[0] == 0 {
                    // values below 2^64 travel as plain uints and magnitudes
                    // carry no leading zeroes
                    return Err(minicbor::decode::Error::message("non-canonical bignum"));
                }

                Uint256::try_from(bytes).map_err(decode_err)
            }
            _ => Err(minicbor::decode::Error::message(
                "invalid data type for Uint256",
            )),
        }
    }
}

/// 20-byte Ethereum account address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EthereumAddress([u8; Self::SIZE]);

impl EthereumAddress {
    pub const SIZE: usize = 20;

    pub const fn new(bytes: [u8; Self::SIZE]) -> Self {
        EthereumAddress(bytes)
    }
}

impl From<[u8; EthereumAddress::SIZE]> for EthereumAddress {
    fn from(bytes: [u8; EthereumAddress::SIZE]) -> Self {
        EthereumAddress(bytes)
    }
}

impl From<Hash<20>> for EthereumAddress {
    fn from(hash: Hash<20>) -> Self {
        EthereumAddress(*hash)
    }
}

impl From<EthereumAddress> for Hash<20> {
    fn from(address: EthereumAddress) -> Self {
        Hash::new(address.0)
    }
}

impl TryFrom<&[u8]> for EthereumAddress {
    type Error = ValidationError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Self::SIZE] =
            value
                .try_into()
                .map_err(|_| ValidationError::WrongLength {
                    field: "EthereumAddress",
                    expected: Self::SIZE,
                    got: value.len(),
                })?;
        Ok(EthereumAddress(bytes))
    }
}

impl AsRef<[u8]> for EthereumAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthereumAddress({self})")
    }
}

impl fmt::Display for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for EthereumAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|_| ValidationError::InvalidField("EthereumAddress", "invalid hex string"))?;
        EthereumAddress::try_from(bytes.as_slice())
    }
}

impl<C> minicbor::Encode<C> for EthereumAddress {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for EthereumAddress {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        EthereumAddress::try_from(d.bytes()?).map_err(decode_err)
    }
}

/// An Ethereum address together with the chain it lives on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChainAddress {
    pub chain_id: u64,
    pub address: EthereumAddress,
}

impl ChainAddress {
    pub fn new(chain_id: u64, address: EthereumAddress) -> Result<Self, ValidationError> {
        let chain_address = ChainAddress { chain_id, address };
        chain_address.validate()?;
        Ok(chain_address)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chain_id == 0 {
            return Err(ValidationError::OutOfRange("ChainID"));
        }

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for ChainAddress {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(2)?;
        e.str("Address")?;
        e.encode_with(self.address, ctx)?;
        e.str("ChainID")?;
        e.u64(self.chain_id)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ChainAddress {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut chain_id = None;
        let mut address = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Address" => address = Some(d.decode_with(ctx)?),
                "ChainID" => chain_id = Some(d.u64()?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ChainAddress field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let chain_address = ChainAddress {
            chain_id: chain_id.ok_or_else(|| missing("ChainID"))?,
            address: address.ok_or_else(|| missing("Address"))?,
        };
        chain_address.validate().map_err(decode_err)?;
        Ok(chain_address)
    }
}

/// RFC 3339 timestamp, encoded as a tag 0 text string in UTC
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(Utc::now())
    }

    pub fn from_rfc3339(s: &str) -> Result<Self, ValidationError> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ValidationError::InvalidField("Timestamp", "invalid rfc3339 string"))?;
        Ok(Timestamp(parsed.with_timezone(&Utc)))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl<C> minicbor::Encode<C> for Timestamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.tag(CborTag::DateTime)?;
        e.str(&self.to_string())?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Timestamp {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        if d.tag()? != CborTag::DateTime {
            return Err(minicbor::decode::Error::message(
                "expected date-time tag for Timestamp",
            ));
        }

        Timestamp::from_rfc3339(d.str()?).map_err(decode_err)
    }
}

/// A shop account: the key cards allowed to sign for it and whether it is a
/// guest account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub key_cards: Vec<PublicKey>,
    pub guest: bool,
}

impl<C> minicbor::Encode<C> for Account {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(2)?;
        e.str("Guest")?;
        e.bool(self.guest)?;
        e.str("KeyCards")?;
        e.array(self.key_cards.len() as u64)?;
        for key in &self.key_cards {
            e.encode_with(key, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Account {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut guest = None;
        let mut key_cards = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Guest" => guest = Some(d.bool()?),
                "KeyCards" => {
                    let count = definite_array(d)?;
                    let cards: Result<Vec<PublicKey>, _> =
                        (0..count).map(|_| d.decode_with(ctx)).collect();
                    key_cards = Some(cards?);
                }
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Account field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Account {
            key_cards: key_cards.ok_or_else(|| missing("KeyCards"))?,
            guest: guest.ok_or_else(|| missing("Guest"))?,
        })
    }
}

/// A named collection of listings; order follows the writer, duplicates are
/// the writer's mistake
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub listings: Vec<u64>,
}

impl<C> minicbor::Encode<C> for Tag {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(2)?;
        e.str("Name")?;
        e.str(&self.name)?;
        e.str("Listings")?;
        e.array(self.listings.len() as u64)?;
        for listing in &self.listings {
            e.u64(*listing)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Tag {
    fn decode(d: &mut minicbor::Decoder<'b>, _ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut name = None;
        let mut listings = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Name" => name = Some(d.str()?.to_owned()),
                "Listings" => {
                    let count = definite_array(d)?;
                    let ids: Result<Vec<u64>, _> = (0..count).map(|_| d.u64()).collect();
                    listings = Some(ids?);
                }
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Tag field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Tag {
            name: name.ok_or_else(|| missing("Name"))?,
            listings: listings.ok_or_else(|| missing("Listings"))?,
        })
    }
}

/// Payment destination chosen for an order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payee {
    pub address: ChainAddress,
    pub call_as_contract: bool,
}

impl<C> minicbor::Encode<C> for Payee {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(2)?;
        e.str("Address")?;
        e.encode_with(self.address, ctx)?;
        e.str("CallAsContract")?;
        e.bool(self.call_as_contract)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Payee {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut address = None;
        let mut call_as_contract = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Address" => address = Some(d.decode_with(ctx)?),
                "CallAsContract" => call_as_contract = Some(d.bool()?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Payee field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Payee {
            address: address.ok_or_else(|| missing("Address"))?,
            call_as_contract: call_as_contract.ok_or_else(|| missing("CallAsContract"))?,
        })
    }
}

/// Per-payee settings stored in the manifest payee table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayeeMetadata {
    pub call_as_contract: bool,
}

impl<C> minicbor::Encode<C> for PayeeMetadata {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(1)?;
        e.str("CallAsContract")?;
        e.bool(self.call_as_contract)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PayeeMetadata {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut call_as_contract = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "CallAsContract" => call_as_contract = Some(d.bool()?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown PayeeMetadata field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(PayeeMetadata {
            call_as_contract: call_as_contract.ok_or_else(|| missing("CallAsContract"))?,
        })
    }
}

/// Absolute price modification: add or subtract a fixed amount
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModificationAbsolute {
    pub amount: Uint256,
    pub plus: bool,
}

impl<C> minicbor::Encode<C> for ModificationAbsolute {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(2)?;
        e.str("Plus")?;
        e.bool(self.plus)?;
        e.str("Amount")?;
        e.encode_with(self.amount, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ModificationAbsolute {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut amount = None;
        let mut plus = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Plus" => plus = Some(d.bool()?),
                "Amount" => amount = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ModificationAbsolute field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(ModificationAbsolute {
            amount: amount.ok_or_else(|| missing("Amount"))?,
            plus: plus.ok_or_else(|| missing("Plus"))?,
        })
    }
}

/// Exactly one of a relative or an absolute price modification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceModifier {
    pub modification_percent: Option<Uint256>,
    pub modification_absolute: Option<ModificationAbsolute>,
}

impl PriceModifier {
    pub fn percent(value: Uint256) -> Self {
        PriceModifier {
            modification_percent: Some(value),
            modification_absolute: None,
        }
    }

    pub fn absolute(value: ModificationAbsolute) -> Self {
        PriceModifier {
            modification_percent: None,
            modification_absolute: Some(value),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.modification_percent, self.modification_absolute) {
            (None, None) => Err(ValidationError::MissingRequired(
                "ModificationPercent or ModificationAbsolute",
            )),
            (Some(_), Some(_)) => Err(ValidationError::InvalidState(
                "price modifier takes only one kind of modification",
            )),
            _ => Ok(()),
        }
    }
}

impl<C> minicbor::Encode<C> for PriceModifier {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(1)?;
        if let Some(percent) = self.modification_percent {
            e.str("ModificationPercent")?;
            e.encode_with(percent, ctx)?;
        }
        if let Some(absolute) = self.modification_absolute {
            e.str("ModificationAbsolute")?;
            e.encode_with(absolute, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PriceModifier {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut modification_percent = None;
        let mut modification_absolute = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "ModificationPercent" => modification_percent = Some(d.decode_with(ctx)?),
                "ModificationAbsolute" => modification_absolute = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown PriceModifier field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let modifier = PriceModifier {
            modification_percent,
            modification_absolute,
        };
        modifier.validate().map_err(decode_err)?;
        Ok(modifier)
    }
}

/// A shipping destination and the price modifiers applying to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShippingRegion {
    pub country: String,
    pub postal_code: String,
    pub city: String,
    pub price_modifiers:
        Option<bazaar_codec::utils::NonEmptyKeyValuePairs<String, PriceModifier>>,
}

impl<C> minicbor::Encode<C> for ShippingRegion {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(3 + self.price_modifiers.is_some() as u64)?;
        e.str("City")?;
        e.str(&self.city)?;
        e.str("Country")?;
        e.str(&self.country)?;
        e.str("PostalCode")?;
        e.str(&self.postal_code)?;
        if let Some(modifiers) = &self.price_modifiers {
            e.str("PriceModifiers")?;
            e.encode_with(modifiers, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ShippingRegion {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut country = None;
        let mut postal_code = None;
        let mut city = None;
        let mut price_modifiers = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "City" => city = Some(d.str()?.to_owned()),
                "Country" => country = Some(d.str()?.to_owned()),
                "PostalCode" => postal_code = Some(d.str()?.to_owned()),
                "PriceModifiers" => price_modifiers = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ShippingRegion field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(ShippingRegion {
            country: country.ok_or_else(|| missing("Country"))?,
            postal_code: postal_code.ok_or_else(|| missing("PostalCode"))?,
            city: city.ok_or_else(|| missing("City"))?,
            price_modifiers,
        })
    }
}
