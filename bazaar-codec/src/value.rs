use minicbor::{
    data::{Tag, Type},
    decode::Error,
    Decode, Encode,
};
use std::cmp::Ordering;

use crate::utils::canonical_key_order;

/// Tagged model of an arbitrary canonical CBOR value
///
/// Payload positions that the schema leaves opaque (patch values, trailing
/// path segments) decode into this variant instead of a concrete struct.
/// Re-encoding always produces canonical bytes: definite lengths, shortest
/// integer forms and maps sorted by their encoded keys. Floating point
/// values are not part of the protocol and are rejected outright.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    UInt(u64),
    NInt(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tagged(Tag, Box<Value>),
    Bool(bool),
    Null,
}

impl Value {
    /// Builds a map value with the entries sorted into canonical key order
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        Value::Map(pairs)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(value.into())
    }
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    let a = minicbor::to_vec(a).expect("Infallible");
    let b = minicbor::to_vec(b).expect("Infallible");
    canonical_key_order(&a, &b)
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<'b, C> Decode<'b, C> for Value {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, Error> {
        match d.datatype()? {
            Type::Bool => Ok(Value::Bool(d.bool()?)),
            Type::Null => {
                d.skip()?;
                Ok(Value::Null)
            }
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => Ok(Value::UInt(d.u64()?)),
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                Ok(Value::NInt(d.i64()?))
            }
            Type::Bytes => Ok(Value::Bytes(d.bytes()?.to_vec())),
            Type::String => Ok(Value::Text(d.str()?.to_owned())),
            Type::Array => {
                let len = d
                    .array()?
                    .ok_or_else(|| Error::message("indefinite-length array"))?;

                let items: Result<Vec<_>, _> = (0..len).map(|_| d.decode_with(ctx)).collect();

                Ok(Value::Array(items?))
            }
            Type::Map => {
                let len = d
                    .map()?
                    .ok_or_else(|| Error::message("indefinite-length map"))?;

                let mut pairs = Vec::with_capacity(len as usize);
                let mut prev: Option<Vec<u8>> = None;

                for _ in 0..len {
                    let key: Value = d.decode_with(ctx)?;
                    let value: Value = d.decode_with(ctx)?;

                    let encoded = minicbor::to_vec(&key).expect("Infallible");
                    if let Some(prev) = &prev {
                        if canonical_key_order(prev, &encoded) != Ordering::Less {
                            return Err(Error::message("map keys out of canonical order"));
                        }
                    }
                    prev = Some(encoded);

                    pairs.push((key, value));
                }

                Ok(Value::Map(pairs))
            }
            Type::Tag => {
                let tag = d.tag()?;
                Ok(Value::Tagged(tag, Box::new(d.decode_with(ctx)?)))
            }
            Type::ArrayIndef | Type::MapIndef | Type::BytesIndef | Type::StringIndef => Err(
                Error::message("indefinite-length item in canonical cbor"),
            ),
            other => Err(Error::message(format!(
                "unsupported cbor data type {other:?} in canonical value"
            ))),
        }
    }
}

impl<C> Encode<C> for Value {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Value::UInt(x) => {
                e.u64(*x)?;
            }
            Value::NInt(x) => {
                e.i64(*x)?;
            }
            Value::Bytes(x) => {
                e.bytes(x)?;
            }
            Value::Text(x) => {
                e.str(x)?;
            }
            Value::Bool(x) => {
                e.bool(*x)?;
            }
            Value::Null => {
                e.null()?;
            }
            Value::Tagged(tag, inner) => {
                e.tag(*tag)?;
                e.encode_with(inner.as_ref(), ctx)?;
            }
            Value::Array(items) => {
                e.array(items.len() as u64)?;

                for item in items {
                    e.encode_with(item, ctx)?;
                }
            }
            Value::Map(pairs) => {
                let mut sorted: Vec<&(Value, Value)> = pairs.iter().collect();
                sorted.sort_by(|(a, _), (b, _)| compare_keys(a, b));

                e.map(sorted.len() as u64)?;

                for (k, v) in sorted {
                    e.encode_with(k, ctx)?;
                    e.encode_with(v, ctx)?;
                }
            }
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &Value) -> Vec<u8> {
        let bytes = minicbor::to_vec(value).unwrap();
        let back: Value = minicbor::decode(&bytes).unwrap();
        assert_eq!(&back, value);
        bytes
    }

    #[test]
    fn scalar_roundtrips() {
        roundtrip(&Value::UInt(0));
        roundtrip(&Value::UInt(u64::MAX));
        roundtrip(&Value::NInt(-42));
        roundtrip(&Value::Bool(true));
        roundtrip(&Value::Null);
        roundtrip(&Value::bytes(vec![0u8; 20]));
        roundtrip(&Value::text("Title"));
    }

    #[test]
    fn map_encodes_in_canonical_order() {
        let value = Value::Map(vec![
            (Value::text("Description"), Value::text("long")),
            (Value::text("Title"), Value::text("short")),
        ]);

        let bytes = minicbor::to_vec(&value).unwrap();

        // "Title" (5 bytes) sorts before "Description" (11 bytes)
        let decoded: Value = minicbor::decode(&bytes).unwrap();
        match decoded {
            Value::Map(pairs) => {
                assert_eq!(pairs[0].0, Value::text("Title"));
                assert_eq!(pairs[1].0, Value::text("Description"));
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn float_is_rejected() {
        // 0xf9 0x3c00 is the half-precision float 1.0
        let bytes = hex::decode("f93c00").unwrap();
        let result: Result<Value, _> = minicbor::decode(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn indefinite_array_is_rejected() {
        // 0x9f .. 0xff is an indefinite-length array
        let bytes = hex::decode("9f0102ff").unwrap();
        let result: Result<Value, _> = minicbor::decode(&bytes);
        assert!(result.is_err());
    }

    mod generated {
        use super::*;
        use proptest::prelude::*;

        fn value_strategy() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                any::<u64>().prop_map(Value::UInt),
                (i64::MIN..0i64).prop_map(Value::NInt),
                proptest::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
                "[a-z]{0,8}".prop_map(Value::Text),
                any::<bool>().prop_map(Value::Bool),
                Just(Value::Null),
            ];

            leaf.prop_recursive(3, 24, 4, |inner| {
                prop_oneof![
                    proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|map| {
                        Value::map(
                            map.into_iter()
                                .map(|(k, v)| (Value::Text(k), v))
                                .collect(),
                        )
                    }),
                ]
            })
        }

        proptest! {
            #[test]
            fn generated_values_roundtrip(value in value_strategy()) {
                let bytes = minicbor::to_vec(&value).unwrap();
                let back: Value = minicbor::decode(&bytes).unwrap();

                prop_assert_eq!(&back, &value);
                prop_assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
            }
        }
    }
}
