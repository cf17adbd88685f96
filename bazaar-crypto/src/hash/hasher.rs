use crate::hash::Hash;
use bazaar_codec::minicbor;
use sha2::{Digest as _, Sha256};

/// handy method to create a hash of given `SIZE` bit size.
///
/// The hash algorithm is `SHA-256`; the constant parameter is the number of
/// bits to generate. Every content commitment in the protocol (trie nodes,
/// mountain range nodes, patch leaves) uses the 256 bit digest.
///
/// # Generate a cryptographic hash with SHA-256
///
/// The following will generate a 32 bytes digest output
///
/// ```
/// # use bazaar_crypto::hash::Hasher;
///
/// let mut hasher = Hasher::<256>::new();
/// hasher.input(b"my key");
///
/// let digest = hasher.finalize();
/// # assert_eq!(
/// #   "a0e12d601e10154fe5743fd6d2ba37492365077b485f06c131ef495420005253",
/// #   hex::encode(digest)
/// # );
/// ```
pub struct Hasher<const BITS: usize>(Sha256);

impl<const BITS: usize> Hasher<BITS> {
    /// update the [`Hasher`] with the given inputs
    #[inline]
    pub fn input(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
}

macro_rules! common_hasher {
    ($size:literal) => {
        impl Hasher<$size> {
            /// create a new [`Hasher`]
            #[inline]
            pub fn new() -> Self {
                Self(Sha256::new())
            }

            /// convenient function to directly generate the hash
            /// of the given bytes without creating the intermediary
            /// types [`Hasher`] and calling [`Hasher::input`].
            #[inline]
            pub fn hash(bytes: &[u8]) -> Hash<{ $size / 8 }> {
                let mut hasher = Self::new();
                hasher.input(bytes);
                hasher.finalize()
            }

            /// convenient function to directly generate the hash
            /// of the given [minicbor::Encode] data object
            #[inline]
            pub fn hash_cbor(data: &impl minicbor::Encode<()>) -> Hash<{ $size / 8 }> {
                let mut hasher = Self::new();
                let () = minicbor::encode(data, &mut hasher).expect("Infallible");
                hasher.finalize()
            }

            /// consume the [`Hasher`] and returns the computed digest
            pub fn finalize(self) -> Hash<{ $size / 8 }> {
                let mut hash = [0; $size / 8];
                hash.copy_from_slice(&self.0.finalize());
                Hash::new(hash)
            }
        }

        impl Default for Hasher<$size> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

common_hasher!(256);

impl<'a, const BITS: usize> minicbor::encode::Write for &'a mut Hasher<BITS> {
    type Error = std::convert::Infallible;

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.input(buf);
        Ok(())
    }
}
