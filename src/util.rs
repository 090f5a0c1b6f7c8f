//! Little-endian scalar conversion, FourCC packing, and CRC-32.
//!
//! Every multi-byte integer on the wire is little-endian; see
//! `CryptedObject`/`Proto`/`EterPack` header docs for field-level layout.
//! `crc32` is the standard IEEE polynomial (`0xEDB8_8320`, reversed),
//! table-driven via `crc32fast` — the same algorithm the original C++
//! `crc32_fast` helper implements.

use crc32fast::Hasher;

/// Read an unaligned little-endian `u32` from the start of `buf`.
///
/// # Panics
/// Panics if `buf` has fewer than 4 bytes.
#[inline]
pub fn from_bytes_le(buf: &[u8]) -> u32 {
    u32::from_le_bytes(buf[..4].try_into().unwrap())
}

/// Write `value` into the first 4 bytes of `buf` as little-endian.
///
/// # Panics
/// Panics if `buf` has fewer than 4 bytes.
#[inline]
pub fn to_bytes_le(value: u32, buf: &mut [u8]) {
    buf[..4].copy_from_slice(&value.to_le_bytes());
}

/// Pack four ASCII bytes into a little-endian `u32` FourCC tag.
///
/// Only the first four bytes of `tag` are used. Shorter tags are
/// zero-padded on the right.
///
/// ```
/// assert_eq!(packtea::util::fourcc("MCOZ"), 0x5A4F_434D);
/// ```
#[inline]
pub fn fourcc(tag: &str) -> u32 {
    let b = tag.as_bytes();
    let mut bytes = [0u8; 4];
    let n = b.len().min(4);
    bytes[..n].copy_from_slice(&b[..n]);
    u32::from_le_bytes(bytes)
}

/// Render a FourCC tag back to its four ASCII bytes (diagnostics only;
/// never parsed back from this representation).
pub fn fourcc_to_string(tag: u32) -> String {
    let bytes = tag.to_le_bytes();
    bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect()
}

/// CRC-32 (IEEE 802.3, polynomial `0xEDB8_8320`) over `data`.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    let mut h = Hasher::new();
    h.update(data);
    h.finalize()
}

/// CRC-32 of a NUL-terminated filename, over exactly `strlen(filename)`
/// bytes — the terminator itself is never included in the checksum.
pub fn crc32_filename(filename: &str) -> u32 {
    let end = filename.find('\0').unwrap_or(filename.len());
    crc32(filename[..end].as_bytes())
}

/// Decode a 32-character uppercase hex string into four little-endian
/// `u32` words (the XTEA key as stored in a text config; spec.md §6).
pub fn key_from_hex(hex_str: &str) -> Option<[u32; 4]> {
    let bytes = hex::decode(hex_str).ok()?;
    if bytes.len() != 16 {
        return None;
    }
    let mut key = [0u32; 4];
    for (i, word) in key.iter_mut().enumerate() {
        *word = from_bytes_le(&bytes[i * 4..i * 4 + 4]);
    }
    Some(key)
}

/// Encode four little-endian `u32` words as a 32-character uppercase hex
/// string (the inverse of [`key_from_hex`]).
pub fn key_to_hex(key: &[u32; 4]) -> String {
    let mut bytes = [0u8; 16];
    for (i, word) in key.iter().enumerate() {
        to_bytes_le(*word, &mut bytes[i * 4..i * 4 + 4]);
    }
    hex::encode_upper(bytes)
}
