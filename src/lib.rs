//! # packtea — CryptedObject / Proto / EterPack binary container family
//!
//! Format guarantees:
//! - All numeric fields are little-endian; never negotiated
//! - `CryptedObject` bodies carry a magic-tag integrity check through every
//!   compression/cryptation stage; a mismatch is always a hard failure
//! - The compressor registry never substitutes a default for an
//!   unregistered FourCC — lookups fail closed
//! - `EterPack`'s index tolerates a corrupt filename CRC on load (the one
//!   documented soft failure in the whole stack); every other mismatch is
//!   a hard fail
//! - XTEA here is the original format's obfuscation layer, not a
//!   confidentiality guarantee

pub mod compressor;
pub mod config;
pub mod crypted_object;
pub mod eterpack;
pub mod proto;
pub mod util;
pub mod xtea;

pub use compressor::{AlgorithmRegistry, Compressor, CompressorError, Lzo1xCompressor, SnappyCompressor};
pub use config::Config;
pub use crypted_object::{decode, decode_with_registry, encode, CryptedObjectError, Mode};
pub use eterpack::{EterPack, EterPackEntry, EterPackError, PackFs, StorageType};
pub use proto::{Proto, ProtoError, ProtoFourCCs, ProtoVariant};
