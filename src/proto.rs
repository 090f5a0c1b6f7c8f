//! Proto — the tabular header wrapping a single embedded CryptedObject.
//!
//! Three FourCC-discriminated shapes share one wire family:
//!
//! ```text
//! MIPX (ItemProto)      fourcc(4) version(4) stride(4) elements(4) crypted_object_size(4)
//! MIPT (ItemProto_Old)  fourcc(4) elements(4) crypted_object_size(4)
//! MMPT (MobProto)       fourcc(4) elements(4) crypted_object_size(4)
//! ```
//!
//! Everything after the header is handed to [`crate::crypted_object`]
//! unmodified. Grounded on `original_source/src/Proto.cpp`
//! (`Proto::Decrypt`/`Proto::Encrypt`).

use crate::compressor::Compressor;
use crate::crypted_object::{self, CryptedObjectError, Mode};
use crate::util::{from_bytes_le, to_bytes_le};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    #[error("input too short to contain a Proto header")]
    InvalidInput,
    #[error("FourCC does not match any known Proto variant")]
    UnknownFourCC,
    #[error("declared crypted_object_size overruns the input buffer")]
    Truncated,
    #[error("embedded CryptedObject failed to decode: {0}")]
    CryptedObject(#[from] CryptedObjectError),
}

/// Which of the three header shapes a Proto buffer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoVariant {
    /// `MIPX`; carries an extra `version`/`stride` pair.
    ItemProto,
    /// `MIPT`; the legacy item table without version/stride.
    ItemProtoOld,
    /// `MMPT`.
    MobProto,
}

impl ProtoVariant {
    fn header_size(self) -> usize {
        match self {
            ProtoVariant::ItemProto => 20,
            ProtoVariant::ItemProtoOld | ProtoVariant::MobProto => 12,
        }
    }
}

/// The FourCC tags each variant is identified by on the wire, taken from
/// [`crate::config::Config`] rather than hardcoded, so a caller with a
/// rekeyed registry can still round-trip.
pub struct ProtoFourCCs {
    pub item: u32,
    pub item_old: u32,
    pub mob: u32,
}

#[derive(Debug, Clone)]
pub struct Proto {
    pub variant: ProtoVariant,
    pub fourcc: u32,
    /// `ItemProto` only; `0` for the other two variants.
    pub version: u32,
    /// `ItemProto` only; `0` for the other two variants.
    pub stride: u32,
    pub elements: u32,
    pub payload: Vec<u8>,
}

/// Parse a Proto header and delegate the remainder to the CryptedObject
/// decoder.
pub fn decode(
    bytes: &[u8],
    fourccs: &ProtoFourCCs,
    algorithm: &dyn Compressor,
    keys: &[u32; 4],
) -> Result<Proto, ProtoError> {
    if bytes.len() < 12 {
        return Err(ProtoError::InvalidInput);
    }

    let fourcc = from_bytes_le(&bytes[0..4]);
    let variant = if fourcc == fourccs.item {
        ProtoVariant::ItemProto
    } else if fourcc == fourccs.item_old {
        ProtoVariant::ItemProtoOld
    } else if fourcc == fourccs.mob {
        ProtoVariant::MobProto
    } else {
        return Err(ProtoError::UnknownFourCC);
    };

    let header_size = variant.header_size();
    if bytes.len() < header_size {
        return Err(ProtoError::InvalidInput);
    }

    let (version, stride, tail_offset) = if variant == ProtoVariant::ItemProto {
        (
            from_bytes_le(&bytes[4..8]),
            from_bytes_le(&bytes[8..12]),
            12,
        )
    } else {
        (0, 0, 4)
    };

    let elements = from_bytes_le(&bytes[tail_offset..tail_offset + 4]);
    let crypted_object_size = from_bytes_le(&bytes[tail_offset + 4..tail_offset + 8]);

    if bytes.len() < header_size + crypted_object_size as usize {
        return Err(ProtoError::Truncated);
    }

    let object_bytes = &bytes[header_size..bytes.len()];
    let payload = crypted_object::decode(object_bytes, algorithm, keys)?;

    Ok(Proto {
        variant,
        fourcc,
        version,
        stride,
        elements,
        payload,
    })
}

/// Build a Proto buffer: encode `input` as a CryptedObject, then prefix
/// the variant-appropriate header with `crypted_object_size` patched to
/// the resulting length.
pub fn encode(
    input: &[u8],
    variant: ProtoVariant,
    elements: u32,
    fourccs: &ProtoFourCCs,
    version: u32,
    stride: u32,
    algorithm: &dyn Compressor,
    keys: &[u32; 4],
    mode: Mode,
) -> Result<Vec<u8>, ProtoError> {
    if input.is_empty() || elements < 1 {
        return Err(ProtoError::InvalidInput);
    }

    let fourcc = match variant {
        ProtoVariant::ItemProto => fourccs.item,
        ProtoVariant::ItemProtoOld => fourccs.item_old,
        ProtoVariant::MobProto => fourccs.mob,
    };

    let object_bytes = crypted_object::encode(input, algorithm, keys, mode)?;

    let header_size = variant.header_size();
    let mut out = vec![0u8; header_size + object_bytes.len()];
    to_bytes_le(fourcc, &mut out[0..4]);

    let tail_offset = if variant == ProtoVariant::ItemProto {
        to_bytes_le(version, &mut out[4..8]);
        to_bytes_le(stride, &mut out[8..12]);
        12
    } else {
        4
    };
    to_bytes_le(elements, &mut out[tail_offset..tail_offset + 4]);
    to_bytes_le(
        object_bytes.len() as u32,
        &mut out[tail_offset + 4..tail_offset + 8],
    );

    out[header_size..].copy_from_slice(&object_bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::Lzo1xCompressor;

    const KEYS: [u32; 4] = [0x02B0_9EB9, 0x0581_696F, 0x289B_9863, 0x001A_1879];

    fn fourccs() -> ProtoFourCCs {
        ProtoFourCCs {
            item: crate::util::fourcc("MIPX"),
            item_old: crate::util::fourcc("MIPT"),
            mob: crate::util::fourcc("MMPT"),
        }
    }

    #[test]
    fn item_proto_roundtrip_carries_version_and_stride() {
        let algo = Lzo1xCompressor::default();
        let table = b"itemdata".repeat(8);
        let encoded = encode(
            &table,
            ProtoVariant::ItemProto,
            4,
            &fourccs(),
            7,
            512,
            &algo,
            &KEYS,
            Mode::CompressAndEncrypt,
        )
        .unwrap();

        let decoded = decode(&encoded, &fourccs(), &algo, &KEYS).unwrap();
        assert_eq!(decoded.variant, ProtoVariant::ItemProto);
        assert_eq!(decoded.version, 7);
        assert_eq!(decoded.stride, 512);
        assert_eq!(decoded.elements, 4);
        assert_eq!(decoded.payload, table);
    }

    #[test]
    fn mob_proto_roundtrip_has_no_version_stride() {
        let algo = Lzo1xCompressor::default();
        let table = b"mobdata!".repeat(3);
        let encoded = encode(
            &table,
            ProtoVariant::MobProto,
            3,
            &fourccs(),
            0,
            0,
            &algo,
            &KEYS,
            Mode::CompressOnly,
        )
        .unwrap();

        let decoded = decode(&encoded, &fourccs(), &algo, &KEYS).unwrap();
        assert_eq!(decoded.variant, ProtoVariant::MobProto);
        assert_eq!(decoded.version, 0);
        assert_eq!(decoded.payload, table);
    }

    #[test]
    fn unknown_fourcc_fails() {
        let algo = Lzo1xCompressor::default();
        let mut bytes = vec![0u8; 12];
        to_bytes_le(crate::util::fourcc("XXXX"), &mut bytes[0..4]);
        assert_eq!(
            decode(&bytes, &fourccs(), &algo, &KEYS).unwrap_err(),
            ProtoError::UnknownFourCC
        );
    }

    #[test]
    fn truncated_crypted_object_size_fails() {
        let algo = Lzo1xCompressor::default();
        let mut bytes = vec![0u8; 12];
        to_bytes_le(crate::util::fourcc("MMPT"), &mut bytes[0..4]);
        to_bytes_le(1, &mut bytes[4..8]);
        to_bytes_le(1000, &mut bytes[8..12]);
        assert_eq!(
            decode(&bytes, &fourccs(), &algo, &KEYS).unwrap_err(),
            ProtoError::Truncated
        );
    }
}
