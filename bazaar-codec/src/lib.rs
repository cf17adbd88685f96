/// Shared re-export of minicbor so every crate encodes against one codec
/// version
pub use minicbor;

/// Canonically ordered map containers and key-order checks
pub mod utils;

/// Tagged model of arbitrary canonical CBOR values
pub mod value;

/// A value that round-trips through the canonical encoding
///
/// Everything committed by the protocol implements both codec halves with a
/// plain `()` context; this alias spares the call sites the double bound.
pub trait Fragment: Sized + for<'b> minicbor::Decode<'b, ()> + minicbor::Encode<()> {}

impl<T> Fragment for T where T: for<'b> minicbor::Decode<'b, ()> + minicbor::Encode<()> + Sized {}

/// Implements the codec pair for enums whose variants are told apart by the
/// data type already on the wire
///
/// Patch paths mix uint indices and text field names in one array with no
/// wrapper around either, so the decoder dispatches on
/// [`minicbor::data::Type`] and the encoder writes the inner value bare.
#[macro_export]
macro_rules! codec_by_datatype {
    ($enum_name:ident, $( $( $cbortype:ident )|* => $variant:ident ),* $(,)?) => {
        impl<'__b, C> minicbor::decode::Decode<'__b, C> for $enum_name {
            fn decode(d: &mut minicbor::Decoder<'__b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
                match d.datatype()? {
                    $( $( minicbor::data::Type::$cbortype )|* => Ok($enum_name::$variant(d.decode_with(ctx)?)), )*
                    other => Err(minicbor::decode::Error::message(format!(
                        "unexpected data type {other:?} for {}",
                        stringify!($enum_name),
                    ))),
                }
            }
        }

        impl<C> minicbor::encode::Encode<C> for $enum_name {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut minicbor::Encoder<W>,
                ctx: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                match self {
                    $( $enum_name::$variant(inner) => {
                        e.encode_with(inner, ctx)?;
                    } )*
                };

                Ok(())
            }
        }
    }
}
