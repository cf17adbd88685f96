//! Typed containers for everything the Bazaar protocol commits to
//!
//! Every type in this crate round-trips through the canonical CBOR dialect:
//! `encode(decode(bytes)) == bytes` holds byte-for-byte, which is what makes
//! the content hashes reproducible across implementations. The hand-written
//! codecs write map keys in canonical order and the decoders reject anything
//! the canonical encoder would never produce: unknown or re-ordered keys,
//! indefinite lengths, floats, or present-but-empty optional containers.

use bazaar_codec::minicbor;
use thiserror::Error;

pub mod base;
pub mod listing;
pub mod manifest;
pub mod order;
pub mod patch;

pub use base::{
    Account, ChainAddress, EthereumAddress, ModificationAbsolute, Payee, PayeeMetadata,
    PriceModifier, ShippingRegion, Tag, Timestamp, Uint256,
};
pub use listing::{
    Listing, ListingMetadata, ListingOption, ListingStockStatus, ListingVariation,
    ListingViewState,
};
pub use manifest::Manifest;
pub use order::{
    AddressDetails, Order, OrderPaid, OrderState, OrderedItem, PaymentDetails,
};
pub use patch::{ObjectType, Op, Patch, PatchPath, PatchSetHeader, PathSegment, SignedPatchSet};

/// Violations of the domain invariants described by the schema
///
/// Raised by constructors and validators, and surfaced through the codec
/// when a decoded value (or a value about to be encoded) breaks them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field {0}")]
    MissingRequired(&'static str),

    #[error("wrong length for {field}: expected {expected} bytes, got {got}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{0} is out of range")]
    OutOfRange(&'static str),

    #[error("invalid field {0}: {1}")]
    InvalidField(&'static str, &'static str),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("{0} must not be empty")]
    EmptyContainer(&'static str),
}

pub(crate) fn decode_err(err: ValidationError) -> minicbor::decode::Error {
    minicbor::decode::Error::message(err.to_string())
}

pub(crate) fn missing(field: &'static str) -> minicbor::decode::Error {
    decode_err(ValidationError::MissingRequired(field))
}

pub(crate) fn definite_map<'b>(
    d: &mut minicbor::Decoder<'b>,
) -> Result<u64, minicbor::decode::Error> {
    d.map()?
        .ok_or_else(|| minicbor::decode::Error::message("indefinite-length map"))
}

pub(crate) fn definite_array<'b>(
    d: &mut minicbor::Decoder<'b>,
) -> Result<u64, minicbor::decode::Error> {
    d.array()?
        .ok_or_else(|| minicbor::decode::Error::message("indefinite-length array"))
}
