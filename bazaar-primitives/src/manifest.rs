//! The shop manifest: payment configuration shared by every order

use bazaar_codec::minicbor;
use bazaar_codec::utils::{check_key_order, KeyValuePairs, NonEmptyKeyValuePairs, Set};

use crate::base::{ChainAddress, EthereumAddress, PayeeMetadata, ShippingRegion, Uint256};
use crate::{definite_map, missing};

/// Payee tables per chain id
pub type Payees = KeyValuePairs<u64, KeyValuePairs<EthereumAddress, PayeeMetadata>>;

/// Currencies accepted for payment, per chain id
pub type AcceptedCurrencies = KeyValuePairs<u64, Set<EthereumAddress>>;

/// Shipping regions by display name; absent when the shop defines none
pub type ShippingRegions = NonEmptyKeyValuePairs<String, ShippingRegion>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub shop_id: Uint256,
    pub payees: Payees,
    pub accepted_currencies: AcceptedCurrencies,
    pub pricing_currency: ChainAddress,
    pub shipping_regions: Option<ShippingRegions>,
}

impl<C> minicbor::Encode<C> for Manifest {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(4 + self.shipping_regions.is_some() as u64)?;
        e.str("Payees")?;
        e.encode_with(&self.payees, ctx)?;
        e.str("ShopID")?;
        e.encode_with(self.shop_id, ctx)?;
        e.str("PricingCurrency")?;
        e.encode_with(self.pricing_currency, ctx)?;
        if let Some(regions) = &self.shipping_regions {
            e.str("ShippingRegions")?;
            e.encode_with(regions, ctx)?;
        }
        e.str("AcceptedCurrencies")?;
        e.encode_with(&self.accepted_currencies, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Manifest {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut shop_id = None;
        let mut payees = None;
        let mut accepted_currencies = None;
        let mut pricing_currency = None;
        let mut shipping_regions = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Payees" => payees = Some(d.decode_with(ctx)?),
                "ShopID" => shop_id = Some(d.decode_with(ctx)?),
                "PricingCurrency" => pricing_currency = Some(d.decode_with(ctx)?),
                "ShippingRegions" => shipping_regions = Some(d.decode_with(ctx)?),
                "AcceptedCurrencies" => accepted_currencies = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Manifest field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(Manifest {
            shop_id: shop_id.ok_or_else(|| missing("ShopID"))?,
            payees: payees.ok_or_else(|| missing("Payees"))?,
            accepted_currencies: accepted_currencies
                .ok_or_else(|| missing("AcceptedCurrencies"))?,
            pricing_currency: pricing_currency.ok_or_else(|| missing("PricingCurrency"))?,
            shipping_regions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_manifest() -> Manifest {
        let address = EthereumAddress::new([
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
            0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
        ]);

        Manifest {
            shop_id: Uint256::from(23),
            payees: vec![(
                1u64,
                vec![(
                    address,
                    PayeeMetadata {
                        call_as_contract: false,
                    },
                )]
                .into(),
            )]
            .into(),
            accepted_currencies: vec![(1u64, vec![address].into())].into(),
            pricing_currency: ChainAddress::new(1, address).unwrap(),
            shipping_regions: None,
        }
    }

    #[test]
    fn known_bytes() {
        let manifest = sample_manifest();
        let bytes = minicbor::to_vec(&manifest).unwrap();

        assert_eq!(
            hex::encode(&bytes),
            "a466506179656573a101a154aabbccddeeff00112233445566778899aabbccdda16e43616c6c4173436f6e7472616374f46653686f704944176f50726963696e6743757272656e6379a2674164647265737354aabbccddeeff00112233445566778899aabbccdd67436861696e49440172416363657074656443757272656e63696573a101a154aabbccddeeff00112233445566778899aabbccdda0"
        );

        let back: Manifest = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, manifest);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn empty_shipping_regions_cannot_exist() {
        // decoding a manifest whose ShippingRegions map is present but empty
        // must fail; absent is the only spelling of "none"
        let golden = hex::encode(minicbor::to_vec(sample_manifest()).unwrap());
        let tail = "72416363657074656443757272656e63696573a101a154aabbccddeeff00112233445566778899aabbccdda0";
        assert!(golden.ends_with(tail));

        let head = &golden[2..golden.len() - tail.len()];
        let spliced = format!("a5{head}6f5368697070696e67526567696f6e73a0{tail}");

        assert!(minicbor::decode::<Manifest>(&hex::decode(spliced).unwrap()).is_err());
    }

    #[test]
    fn shipping_regions_roundtrip() {
        let mut manifest = sample_manifest();
        manifest.shipping_regions = Some(
            vec![(
                "domestic".to_owned(),
                ShippingRegion {
                    country: "Germany".to_owned(),
                    postal_code: "".to_owned(),
                    city: "".to_owned(),
                    price_modifiers: None,
                },
            )]
            .try_into()
            .unwrap(),
        );

        let bytes = minicbor::to_vec(&manifest).unwrap();
        let back: Manifest = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, manifest);
    }
}
