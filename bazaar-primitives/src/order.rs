//! Orders and their payment lifecycle

use bazaar_codec::minicbor;
use bazaar_codec::utils::check_key_order;
use bazaar_crypto::hash::Hash;
use bazaar_crypto::key::secp256k1::Signature;

use crate::base::{ChainAddress, Payee, Timestamp, Uint256};
use crate::{decode_err, definite_array, definite_map, missing, ValidationError};

/// Lifecycle state of an order
///
/// `Open → (Canceled | Committed → PaymentChosen → Unpaid → Paid)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderState {
    Unspecified,
    Open,
    Canceled,
    Committed,
    PaymentChosen,
    Unpaid,
    Paid,
}

impl OrderState {
    pub fn to_u64(self) -> u64 {
        match self {
            OrderState::Unspecified => 0,
            OrderState::Open => 1,
            OrderState::Canceled => 2,
            OrderState::Committed => 3,
            OrderState::PaymentChosen => 4,
            OrderState::Unpaid => 5,
            OrderState::Paid => 6,
        }
    }

    pub fn from_u64(value: u64) -> Result<Self, ValidationError> {
        match value {
            0 => Ok(OrderState::Unspecified),
            1 => Ok(OrderState::Open),
            2 => Ok(OrderState::Canceled),
            3 => Ok(OrderState::Committed),
            4 => Ok(OrderState::PaymentChosen),
            5 => Ok(OrderState::Unpaid),
            6 => Ok(OrderState::Paid),
            _ => Err(ValidationError::OutOfRange("State")),
        }
    }
}

impl<C> minicbor::Encode<C> for OrderState {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.to_u64())?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for OrderState {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        OrderState::from_u64(d.u64()?).map_err(decode_err)
    }
}

/// One listing (possibly a specific variation) and a quantity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedItem {
    pub listing_id: u64,
    pub quantity: u64,
    pub variation_ids: Option<Vec<String>>,
}

impl OrderedItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.listing_id == 0 {
            return Err(ValidationError::OutOfRange("ListingID"));
        }

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for OrderedItem {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(2 + self.variation_ids.is_some() as u64)?;
        e.str("Quantity")?;
        e.u64(self.quantity)?;
        e.str("ListingID")?;
        e.u64(self.listing_id)?;
        if let Some(ids) = &self.variation_ids {
            e.str("VariationIDs")?;
            e.array(ids.len() as u64)?;
            for id in ids {
                e.str(id)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for OrderedItem {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut listing_id = None;
        let mut quantity = None;
        let mut variation_ids = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "Quantity" => quantity = Some(d.u64()?),
                "ListingID" => listing_id = Some(d.u64()?),
                "VariationIDs" => {
                    let count = definite_array(d)?;
                    let ids: Result<Vec<String>, _> =
                        (0..count).map(|_| d.str().map(str::to_owned)).collect();
                    variation_ids = Some(ids?);
                }
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown OrderedItem field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let item = OrderedItem {
            listing_id: listing_id.ok_or_else(|| missing("ListingID"))?,
            quantity: quantity.ok_or_else(|| missing("Quantity"))?,
            variation_ids,
        };
        item.validate().map_err(decode_err)?;
        Ok(item)
    }
}

/// Invoice or shipping address attached to a committed order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressDetails {
    pub name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub country: String,
    pub email_address: String,
    pub phone_number: Option<String>,
}

impl<C> minicbor::Encode<C> for AddressDetails {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let optional = self.address2.is_some() as u64
            + self.postal_code.is_some() as u64
            + self.phone_number.is_some() as u64;

        e.map(5 + optional)?;
        e.str("City")?;
        e.str(&self.city)?;
        e.str("Name")?;
        e.str(&self.name)?;
        e.str("Country")?;
        e.str(&self.country)?;
        e.str("Address1")?;
        e.str(&self.address1)?;
        if let Some(address2) = &self.address2 {
            e.str("Address2")?;
            e.str(address2)?;
        }
        if let Some(postal_code) = &self.postal_code {
            e.str("PostalCode")?;
            e.str(postal_code)?;
        }
        if let Some(phone_number) = &self.phone_number {
            e.str("PhoneNumber")?;
            e.str(phone_number)?;
        }
        e.str("EmailAddress")?;
        e.str(&self.email_address)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for AddressDetails {
    fn decode(
        d: &mut minicbor::Decoder<'b>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut name = None;
        let mut address1 = None;
        let mut address2 = None;
        let mut city = None;
        let mut postal_code = None;
        let mut country = None;
        let mut email_address = None;
        let mut phone_number = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "City" => city = Some(d.str()?.to_owned()),
                "Name" => name = Some(d.str()?.to_owned()),
                "Country" => country = Some(d.str()?.to_owned()),
                "Address1" => address1 = Some(d.str()?.to_owned()),
                "Address2" => address2 = Some(d.str()?.to_owned()),
                "PostalCode" => postal_code = Some(d.str()?.to_owned()),
                "PhoneNumber" => phone_number = Some(d.str()?.to_owned()),
                "EmailAddress" => email_address = Some(d.str()?.to_owned()),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown AddressDetails field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(AddressDetails {
            name: name.ok_or_else(|| missing("Name"))?,
            address1: address1.ok_or_else(|| missing("Address1"))?,
            address2,
            city: city.ok_or_else(|| missing("City"))?,
            postal_code,
            country: country.ok_or_else(|| missing("Country"))?,
            email_address: email_address.ok_or_else(|| missing("EmailAddress"))?,
            phone_number,
        })
    }
}

/// The payment request issued for an order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentDetails {
    pub payment_id: Hash<32>,
    pub total: Uint256,
    pub listing_hashes: Vec<Hash<32>>,
    pub ttl: u64,
    pub shop_signature: Signature,
}

impl PaymentDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.listing_hashes.is_empty() {
            return Err(ValidationError::EmptyContainer("ListingHashes"));
        }
        if self.ttl == 0 {
            return Err(ValidationError::OutOfRange("TTL"));
        }

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for PaymentDetails {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        e.map(5)?;
        e.str("TTL")?;
        e.u64(self.ttl)?;
        e.str("Total")?;
        e.encode_with(self.total, ctx)?;
        e.str("PaymentID")?;
        e.encode_with(self.payment_id, ctx)?;
        e.str("ListingHashes")?;
        e.array(self.listing_hashes.len() as u64)?;
        for hash in &self.listing_hashes {
            e.encode_with(hash, ctx)?;
        }
        e.str("ShopSignature")?;
        e.encode_with(self.shop_signature, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PaymentDetails {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut payment_id = None;
        let mut total = None;
        let mut listing_hashes = None;
        let mut ttl = None;
        let mut shop_signature = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "TTL" => ttl = Some(d.u64()?),
                "Total" => total = Some(d.decode_with(ctx)?),
                "PaymentID" => payment_id = Some(d.decode_with(ctx)?),
                "ListingHashes" => {
                    let count = definite_array(d)?;
                    let hashes: Result<Vec<Hash<32>>, _> =
                        (0..count).map(|_| d.decode_with(ctx)).collect();
                    listing_hashes = Some(hashes?);
                }
                "ShopSignature" => shop_signature = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown PaymentDetails field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let details = PaymentDetails {
            payment_id: payment_id.ok_or_else(|| missing("PaymentID"))?,
            total: total.ok_or_else(|| missing("Total"))?,
            listing_hashes: listing_hashes.ok_or_else(|| missing("ListingHashes"))?,
            ttl: ttl.ok_or_else(|| missing("TTL"))?,
            shop_signature: shop_signature.ok_or_else(|| missing("ShopSignature"))?,
        };
        details.validate().map_err(decode_err)?;
        Ok(details)
    }
}

/// On-chain settlement details recorded once an order is paid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderPaid {
    pub block_hash: Hash<32>,
    pub tx_hash: Option<Hash<32>>,
}

impl<C> minicbor::Encode<C> for OrderPaid {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(1 + self.tx_hash.is_some() as u64)?;
        if let Some(tx_hash) = self.tx_hash {
            e.str("TxHash")?;
            e.encode_with(tx_hash, ctx)?;
        }
        e.str("BlockHash")?;
        e.encode_with(self.block_hash, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for OrderPaid {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut block_hash = None;
        let mut tx_hash = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "TxHash" => tx_hash = Some(d.decode_with(ctx)?),
                "BlockHash" => block_hash = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown OrderPaid field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        Ok(OrderPaid {
            block_hash: block_hash.ok_or_else(|| missing("BlockHash"))?,
            tx_hash,
        })
    }
}

/// A buyer's order as it moves towards payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: u64,
    pub items: Vec<OrderedItem>,
    pub state: OrderState,
    pub invoice_address: Option<AddressDetails>,
    pub shipping_address: Option<AddressDetails>,
    pub canceled_at: Option<Timestamp>,
    pub chosen_payee: Option<Payee>,
    pub chosen_currency: Option<ChainAddress>,
    pub payment_details: Option<PaymentDetails>,
    pub tx_details: Option<OrderPaid>,
}

impl Order {
    /// Checks the field requirements the lifecycle state imposes
    pub fn validate(&self) -> Result<(), ValidationError> {
        for item in &self.items {
            item.validate()?;
        }

        if self.state == OrderState::Paid && self.tx_details.is_none() {
            return Err(ValidationError::InvalidState(
                "TxDetails is required when state is Paid",
            ));
        }

        if matches!(self.state, OrderState::Paid | OrderState::Unpaid)
            && self.payment_details.is_none()
        {
            return Err(ValidationError::InvalidState(
                "PaymentDetails is required when state is Unpaid or Paid",
            ));
        }

        if matches!(
            self.state,
            OrderState::Paid | OrderState::Unpaid | OrderState::Committed
        ) {
            if self.chosen_payee.is_none() {
                return Err(ValidationError::InvalidState(
                    "ChosenPayee is required when state is Committed, Unpaid or Paid",
                ));
            }
            if self.chosen_currency.is_none() {
                return Err(ValidationError::InvalidState(
                    "ChosenCurrency is required when state is Committed, Unpaid or Paid",
                ));
            }
            if self.invoice_address.is_none() && self.shipping_address.is_none() {
                return Err(ValidationError::InvalidState(
                    "an invoice or shipping address is required when state is Committed, Unpaid or Paid",
                ));
            }
        }

        if self.state == OrderState::Canceled && self.canceled_at.is_none() {
            return Err(ValidationError::InvalidState(
                "CanceledAt is required when state is Canceled",
            ));
        }

        Ok(())
    }
}

impl<C> minicbor::Encode<C> for Order {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        self.validate()
            .map_err(|err| minicbor::encode::Error::message(err.to_string()))?;

        let optional = self.invoice_address.is_some() as u64
            + self.shipping_address.is_some() as u64
            + self.canceled_at.is_some() as u64
            + self.chosen_payee.is_some() as u64
            + self.chosen_currency.is_some() as u64
            + self.payment_details.is_some() as u64
            + self.tx_details.is_some() as u64;

        e.map(3 + optional)?;
        e.str("ID")?;
        e.u64(self.id)?;
        e.str("Items")?;
        e.array(self.items.len() as u64)?;
        for item in &self.items {
            e.encode_with(item, ctx)?;
        }
        e.str("State")?;
        e.encode_with(self.state, ctx)?;
        if let Some(tx_details) = &self.tx_details {
            e.str("TxDetails")?;
            e.encode_with(tx_details, ctx)?;
        }
        if let Some(canceled_at) = &self.canceled_at {
            e.str("CanceledAt")?;
            e.encode_with(canceled_at, ctx)?;
        }
        if let Some(chosen_payee) = &self.chosen_payee {
            e.str("ChosenPayee")?;
            e.encode_with(chosen_payee, ctx)?;
        }
        if let Some(chosen_currency) = &self.chosen_currency {
            e.str("ChosenCurrency")?;
            e.encode_with(chosen_currency, ctx)?;
        }
        if let Some(invoice_address) = &self.invoice_address {
            e.str("InvoiceAddress")?;
            e.encode_with(invoice_address, ctx)?;
        }
        if let Some(payment_details) = &self.payment_details {
            e.str("PaymentDetails")?;
            e.encode_with(payment_details, ctx)?;
        }
        if let Some(shipping_address) = &self.shipping_address {
            e.str("ShippingAddress")?;
            e.encode_with(shipping_address, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Order {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let len = definite_map(d)?;

        let mut id = None;
        let mut items = None;
        let mut state = None;
        let mut invoice_address = None;
        let mut shipping_address = None;
        let mut canceled_at = None;
        let mut chosen_payee = None;
        let mut chosen_currency = None;
        let mut payment_details = None;
        let mut tx_details = None;
        let mut prev: Option<&str> = None;

        for _ in 0..len {
            let key = d.str()?;
            check_key_order(prev, key)?;
            match key {
                "ID" => id = Some(d.u64()?),
                "Items" => {
                    let count = definite_array(d)?;
                    let decoded: Result<Vec<OrderedItem>, _> =
                        (0..count).map(|_| d.decode_with(ctx)).collect();
                    items = Some(decoded?);
                }
                "State" => state = Some(d.decode_with(ctx)?),
                "TxDetails" => tx_details = Some(d.decode_with(ctx)?),
                "CanceledAt" => canceled_at = Some(d.decode_with(ctx)?),
                "ChosenPayee" => chosen_payee = Some(d.decode_with(ctx)?),
                "ChosenCurrency" => chosen_currency = Some(d.decode_with(ctx)?),
                "InvoiceAddress" => invoice_address = Some(d.decode_with(ctx)?),
                "PaymentDetails" => payment_details = Some(d.decode_with(ctx)?),
                "ShippingAddress" => shipping_address = Some(d.decode_with(ctx)?),
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unknown Order field {key}"
                    )))
                }
            }
            prev = Some(key);
        }

        let order = Order {
            id: id.ok_or_else(|| missing("ID"))?,
            items: items.ok_or_else(|| missing("Items"))?,
            state: state.ok_or_else(|| missing("State"))?,
            invoice_address,
            shipping_address,
            canceled_at,
            chosen_payee,
            chosen_currency,
            payment_details,
            tx_details,
        };
        order.validate().map_err(decode_err)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::EthereumAddress;

    fn open_order() -> Order {
        Order {
            id: 300,
            items: vec![OrderedItem {
                listing_id: 1,
                quantity: 2,
                variation_ids: None,
            }],
            state: OrderState::Open,
            invoice_address: None,
            shipping_address: None,
            canceled_at: None,
            chosen_payee: None,
            chosen_currency: None,
            payment_details: None,
            tx_details: None,
        }
    }

    fn sample_address() -> AddressDetails {
        AddressDetails {
            name: "Ada".to_owned(),
            address1: "1 Main St".to_owned(),
            address2: None,
            city: "Berlin".to_owned(),
            postal_code: Some("10115".to_owned()),
            country: "Germany".to_owned(),
            email_address: "ada@example.com".to_owned(),
            phone_number: None,
        }
    }

    fn payee() -> Payee {
        Payee {
            address: ChainAddress::new(1, EthereumAddress::new([0x11; 20])).unwrap(),
            call_as_contract: false,
        }
    }

    fn committed_order() -> Order {
        let mut order = open_order();
        order.state = OrderState::Committed;
        order.invoice_address = Some(sample_address());
        order.chosen_payee = Some(payee());
        order.chosen_currency = Some(payee().address);
        order
    }

    #[test]
    fn known_bytes() {
        let order = open_order();
        let bytes = minicbor::to_vec(&order).unwrap();

        assert_eq!(
            hex::encode(&bytes),
            "a362494419012c654974656d7381a2685175616e7469747902694c697374696e6749440165537461746501"
        );

        let back: Order = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, order);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn committed_order_needs_payee_currency_and_address() {
        let order = committed_order();
        assert!(order.validate().is_ok());

        let mut missing_payee = order.clone();
        missing_payee.chosen_payee = None;
        assert!(missing_payee.validate().is_err());
        assert!(minicbor::to_vec(&missing_payee).is_err());

        let mut missing_currency = order.clone();
        missing_currency.chosen_currency = None;
        assert!(missing_currency.validate().is_err());

        let mut missing_address = order;
        missing_address.invoice_address = None;
        assert!(missing_address.validate().is_err());
    }

    #[test]
    fn paid_order_needs_details() {
        let mut order = committed_order();
        order.state = OrderState::Paid;
        assert!(order.validate().is_err());

        order.payment_details = Some(PaymentDetails {
            payment_id: Hash::new([0xab; 32]),
            total: Uint256::from(2000),
            listing_hashes: vec![Hash::new([0x01; 32])],
            ttl: 3600,
            shop_signature: Signature::from([0x0a; 65]),
        });
        assert!(order.validate().is_err());

        order.tx_details = Some(OrderPaid {
            block_hash: Hash::new([0xcd; 32]),
            tx_hash: None,
        });
        assert!(order.validate().is_ok());

        let bytes = minicbor::to_vec(&order).unwrap();
        let back: Order = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, order);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn canceled_order_needs_timestamp() {
        let mut order = open_order();
        order.state = OrderState::Canceled;
        assert!(order.validate().is_err());

        order.canceled_at = Some(Timestamp::from_rfc3339("2023-02-01T09:30:00Z").unwrap());
        assert!(order.validate().is_ok());

        let bytes = minicbor::to_vec(&order).unwrap();
        let back: Order = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn payment_details_invariants() {
        let details = PaymentDetails {
            payment_id: Hash::new([0xab; 32]),
            total: Uint256::from(2000),
            listing_hashes: vec![],
            ttl: 0,
            shop_signature: Signature::from([0x0a; 65]),
        };
        assert_eq!(
            details.validate(),
            Err(ValidationError::EmptyContainer("ListingHashes"))
        );

        let details = PaymentDetails {
            listing_hashes: vec![Hash::new([0x01; 32])],
            ..details
        };
        assert_eq!(details.validate(), Err(ValidationError::OutOfRange("TTL")));
    }

    #[test]
    fn zero_listing_id_is_rejected() {
        let item = OrderedItem {
            listing_id: 0,
            quantity: 1,
            variation_ids: None,
        };
        assert_eq!(item.validate(), Err(ValidationError::OutOfRange("ListingID")));
        assert!(minicbor::to_vec(&item).is_err());
    }
}
