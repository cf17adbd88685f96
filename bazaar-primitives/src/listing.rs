//! Listings: the items offered by a shop, their variations and stock

use bazaar_codec::minicbor;
use bazaar_codec::utils::{check_key_order, NonEmptyKeyValuePairs};

use crate::base::{PriceModifier, Timestamp, Uint256};
use crate::{decode_err, definite_array, definite_map, missing, ValidationError};

/// Publication state of a listing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListingViewState {
    #[default]
    Unspecified,
    Published,
    Deleted,
}

impl ListingViewState {
    pub fn to_u64(self) -> u64 {
        match self {
            ListingViewState::Unspecified => 0,
            ListingViewState::Published => 1,
            ListingViewState::Deleted => 2,
        }
    }

    pub fn from_u64(value: u64) -> Result<Self, ValidationError> {
        match value {
            0 => Ok(ListingViewState::Unspecified),
            1 => Ok(ListingViewState::Published),
            2 => Ok(ListingViewState::Deleted),
            _ => Err(ValidationError::OutOfRange("ViewState")),
        }
    }
}

impl<C> minicbor::Encode<C> for ListingViewState {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.to_u64())?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ListingViewState {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        ListingViewState::from_u64(d.u64()?).map_err(decode_err)
    }
}

/// Display info for a listing or one of its variations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingMetadata {
    pub title: String,
    pub description: String,
    pub images: Option<Vec<String>>,
}

impl<C> minicbor::Encode<C> for ListingMetadata {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(2 + self.images.is_some() as u64)?;
        e.str("Title")?;
        e.str(&self.title)?;
        if let Some(images) = &self.images {
            e.str("Images")?;
            e.array(images.len() as u64)?;
            for image in images {
                e.str(image)?;
            }
        }
        e.str("Description")?;
        e.str(&self.description)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ListingMetadata {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut title = None;
        let mut description = None;
        let mut images = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Title" => title = Some(d.str()?.to_owned()),
                "Images" => {
                    let count = definite_array(d)?;
                    let urls: Result<Vec<String>, _> =
                        (0..count).map(|_| d.str().map(str::to_owned)).collect();
                    images = Some(urls?);
                }
                "Description" => description = Some(d.str()?.to_owned()),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ListingMetadata field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(ListingMetadata {
            title: title.ok_or_else(|| missing("Title"))?,
            description: description.ok_or_else(|| missing("Description"))?,
            images,
        })
    }
}

/// A single variation of a listing option
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingVariation {
    pub variation_info: ListingMetadata,
    pub price_modifier: Option<PriceModifier>,
    pub sku: Option<String>,
}

impl<C> minicbor::Encode<C> for ListingVariation {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(1 + self.price_modifier.is_some() as u64 + self.sku.is_some() as u64)?;
        if let Some(sku) = &self.sku {
            e.str("SKU")?;
            e.str(sku)?;
        }
        if let Some(modifier) = &self.price_modifier {
            e.str("PriceModifier")?;
            e.encode_with(modifier, ctx)?;
        }
        e.str("VariationInfo")?;
        e.encode_with(&self.variation_info, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ListingVariation {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut variation_info = None;
        let mut price_modifier = None;
        let mut sku = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "SKU" => sku = Some(d.str()?.to_owned()),
                "PriceModifier" => price_modifier = Some(d.decode_with(ctx)?),
                "VariationInfo" => variation_info = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ListingVariation field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(ListingVariation {
            variation_info: variation_info.ok_or_else(|| missing("VariationInfo"))?,
            price_modifier,
            sku,
        })
    }
}

/// A configurable aspect of a listing (size, colour, ...) and its variations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingOption {
    pub title: String,
    pub variations: Option<NonEmptyKeyValuePairs<String, ListingVariation>>,
}

impl<C> minicbor::Encode<C> for ListingOption {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(1 + self.variations.is_some() as u64)?;
        e.str("Title")?;
        e.str(&self.title)?;
        if let Some(variations) = &self.variations {
            e.str("Variations")?;
            e.encode_with(variations, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ListingOption {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut title = None;
        let mut variations = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Title" => title = Some(d.str()?.to_owned()),
                "Variations" => variations = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ListingOption field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(ListingOption {
            title: title.ok_or_else(|| missing("Title"))?,
            variations,
        })
    }
}

/// Stock state for one combination of variations
///
/// Carries exactly one of `in_stock` or `expected_in_stock_by`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingStockStatus {
    pub variation_ids: Vec<String>,
    pub in_stock: Option<bool>,
    pub expected_in_stock_by: Option<Timestamp>,
}

impl ListingStockStatus {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.in_stock, self.expected_in_stock_by) {
            (None, None) => Err(ValidationError::MissingRequired(
                "InStock or ExpectedInStockBy",
            )),
            (Some(_), Some(_)) => Err(ValidationError::InvalidState(
                "stock status takes either a flag or an availability date",
            )),
            _ => Ok(()),
        }
    }
}

impl<C> minicbor::Encode<C> for ListingStockStatus {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(2)?;
        if let Some(in_stock) = self.in_stock {
            e.str("InStock")?;
            e.bool(in_stock)?;
        }
        e.str("VariationIDs")?;
        e.array(self.variation_ids.len() as u64)?;
        for id in &self.variation_ids {
            e.str(id)?;
        }
        if let Some(expected) = &self.expected_in_stock_by {
            e.str("ExpectedInStockBy")?;
            e.encode_with(expected, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ListingStockStatus {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut variation_ids = None;
        let mut in_stock = None;
        let mut expected_in_stock_by = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "InStock" => in_stock = Some(d.bool()?),
                "VariationIDs" => {
                    let count = definite_array(d)?;
                    let ids: Result<Vec<String>, _> =
                        (0..count).map(|_| d.str().map(str::to_owned)).collect();
                    variation_ids = Some(ids?);
                }
                "ExpectedInStockBy" => expected_in_stock_by = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown ListingStockStatus field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let status = ListingStockStatus {
            variation_ids: variation_ids.ok_or_else(|| missing("VariationIDs"))?,
            in_stock,
            expected_in_stock_by,
        };
        status.validate().map_err(decode_err)?;
        Ok(status)
    }
}

/// An item offered by the shop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub id: u64,
    pub price: Uint256,
    pub metadata: ListingMetadata,
    pub view_state: ListingViewState,
    pub options: Option<NonEmptyKeyValuePairs<String, ListingOption>>,
    pub stock_statuses: Option<Vec<ListingStockStatus>>,
}

impl<C> minicbor::Encode<C> for Listing {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(4 + self.options.is_some() as u64 + self.stock_statuses.is_some() as u64)?;
        e.str("ID")?;
        e.u64(self.id)?;
        e.str("Price")?;
        e.encode_with(self.price, ctx)?;
        if let Some(options) = &self.options {
            e.str("Options")?;
            e.encode_with(options, ctx)?;
        }
        e.str("Metadata")?;
        e.encode_with(&self.metadata, ctx)?;
        e.str("ViewState")?;
        e.encode_with(self.view_state, ctx)?;
        if let Some(statuses) = &self.stock_statuses {
            e.str("StockStatuses")?;
            e.array(statuses.len() as u64)?;
            for status in statuses {
                e.encode_with(status, ctx)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Listing {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut id = None;
        let mut price = None;
        let mut metadata = None;
        let mut view_state = None;
        let mut options = None;
        let mut stock_statuses = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "ID" => id = Some(d.u64()?),
                "Price" => price = Some(d.decode_with(ctx)?),
                "Options" => options = Some(d.decode_with(ctx)?),
                "Metadata" => metadata = Some(d.decode_with(ctx)?),
                "ViewState" => view_state = Some(d.decode_with(ctx)?),
                "StockStatuses" => {
                    let count = definite_array(d)?;
                    let statuses: Result<Vec<ListingStockStatus>, _> =
                        (0..count).map(|_| d.decode_with(ctx)).collect();
                    stock_statuses = Some(statuses?);
                }
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Listing field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Listing {
            id: id.ok_or_else(|| missing("ID"))?,
            price: price.ok_or_else(|| missing("Price"))?,
            metadata: metadata.ok_or_else(|| missing("Metadata"))?,
            view_state: view_state.ok_or_else(|| missing("ViewState"))?,
            options,
            stock_statuses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            id: 1,
            price: Uint256::from(1000),
            metadata: ListingMetadata {
                title: "t-shirt".to_owned(),
                description: "blue".to_owned(),
                images: None,
            },
            view_state: ListingViewState::Published,
            options: None,
            stock_statuses: None,
        }
    }

    #[test]
    fn known_bytes() {
        let listing = sample_listing();
        let bytes = minicbor::to_vec(&listing).unwrap();

        assert_eq!(
            hex::encode(&bytes),
            "a4624944016550726963651903e8684d65746164617461a2655469746c6567742d73686972746b4465736372697074696f6e64626c75656956696577537461746501"
        );

        let back: Listing = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, listing);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn full_listing_roundtrip() {
        let mut listing = sample_listing();
        listing.metadata.images = Some(vec!["https://example.com/shirt.png".to_owned()]);
        listing.options = Some(
            vec![(
                "size".to_owned(),
                ListingOption {
                    title: "Size".to_owned(),
                    variations: Some(
                        vec![
                            (
                                "m".to_owned(),
                                ListingVariation {
                                    variation_info: ListingMetadata {
                                        title: "M".to_owned(),
                                        description: "medium".to_owned(),
                                        images: None,
                                    },
                                    price_modifier: None,
                                    sku: Some("shirt-m".to_owned()),
                                },
                            ),
                            (
                                "l".to_owned(),
                                ListingVariation {
                                    variation_info: ListingMetadata {
                                        title: "L".to_owned(),
                                        description: "large".to_owned(),
                                        images: None,
                                    },
                                    price_modifier: Some(PriceModifier::percent(Uint256::from(
                                        110,
                                    ))),
                                    sku: None,
                                },
                            ),
                        ]
                        .try_into()
                        .unwrap(),
                    ),
                },
            )]
            .try_into()
            .unwrap(),
        );
        listing.stock_statuses = Some(vec![
            ListingStockStatus {
                variation_ids: vec!["m".to_owned()],
                in_stock: Some(true),
                expected_in_stock_by: None,
            },
            ListingStockStatus {
                variation_ids: vec!["l".to_owned()],
                in_stock: None,
                expected_in_stock_by: Some(
                    Timestamp::from_rfc3339("2024-06-01T00:00:00Z").unwrap(),
                ),
            },
        ]);

        let bytes = minicbor::to_vec(&listing).unwrap();
        let back: Listing = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, listing);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn stock_status_wants_exactly_one_kind() {
        let both = ListingStockStatus {
            variation_ids: vec![],
            in_stock: Some(true),
            expected_in_stock_by: Some(Timestamp::from_rfc3339("2024-06-01T00:00:00Z").unwrap()),
        };
        assert!(both.validate().is_err());
        assert!(minicbor::to_vec(&both).is_err());

        let neither = ListingStockStatus {
            variation_ids: vec![],
            in_stock: None,
            expected_in_stock_by: None,
        };
        assert!(neither.validate().is_err());
    }

    #[test]
    fn unknown_view_state_is_rejected() {
        // ViewState 9 in an otherwise valid listing
        let golden = "a4624944016550726963651903e8684d65746164617461a2655469746c6567742d73686972746b4465736372697074696f6e64626c75656956696577537461746501";
        let tampered = golden.replace("6956696577537461746501", "6956696577537461746509");
        let bytes = hex::decode(tampered).unwrap();

        assert!(minicbor::decode::<Listing>(&bytes).is_err());
    }
}
