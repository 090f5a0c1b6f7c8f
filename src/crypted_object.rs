//! CryptedObject — the hard core of this crate: a 16-byte header in front
//! of an optionally-compressed, optionally-XTEA-encrypted body, with a
//! magic-prefix integrity check threaded through every stage.
//!
//! # On-disk layout (16-byte header, little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   fourcc               compressor identity tag
//!    4      4   after_crypt_len      0, or after_compress_len + 20
//!    8      4   after_compress_len   0 when compression was skipped
//!   12      4   real_len             uncompressed payload size
//! ```
//!
//! Body immediately follows the header; see [`encode`]/[`decode`] for the
//! three body shapes (cryptated / compressed-only / identity).
//!
//! Grounded on `original_source/src/CryptedObject.cpp` (`arves100/
//! LibLyketo`): the `N - H == after_crypt_len + M` check on the
//! cryptation branch and the `after_crypt_len = after_compress_len + 20`
//! asymmetry on encode are both preserved verbatim per spec.md §9 — do
//! not "fix" them into a symmetric pair.

use crate::compressor::{AlgorithmRegistry, Compressor};
use crate::util::{from_bytes_le, to_bytes_le};
use crate::xtea;
use thiserror::Error;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 16;
/// Size of the magic-tag prefix embedded ahead of compressed/cryptated
/// bodies.
pub const MAGIC_SIZE: usize = 4;
/// XTEA round count used throughout this format.
const XTEA_ROUNDS_CUSHION: usize = 20; // 4-byte magic + 16-byte historical cushion

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptedObjectError {
    #[error("input buffer too small or empty")]
    InvalidInput,
    #[error("no usable compression algorithm supplied")]
    InvalidAlgorithm,
    #[error("header is malformed or does not match the expected algorithm")]
    InvalidHeader,
    #[error("compressed-region length does not match the declared header field")]
    InvalidCompressLength,
    #[error("decompressed length does not match the declared real_len")]
    InvalidRealLength,
    #[error("cryptated-region length does not match the declared header field")]
    InvalidCryptLength,
    #[error("XTEA-decrypted plaintext failed its magic-tag integrity check")]
    CryptFail,
    #[error("algorithm does not support encryption but the stream carries a cryptation stage")]
    InvalidCryptAlgorithm,
    #[error("underlying compressor rejected the data")]
    CompressFail,
    #[error("embedded FourCC tag does not match the header")]
    InvalidFourCC,
}

/// The encode-side transformation pipeline: `compress -> prefix magic ->
/// encrypt`, applied up to (but not beyond) the requested stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Store the payload verbatim after the header.
    None,
    /// Compress only; body is `magic || compressed`.
    CompressOnly,
    /// Compress, then XTEA-encrypt `magic || compressed`.
    CompressAndEncrypt,
}

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub fourcc: u32,
    pub after_crypt_len: u32,
    pub after_compress_len: u32,
    pub real_len: u32,
}

impl Header {
    fn parse(buf: &[u8]) -> Self {
        Self {
            fourcc: from_bytes_le(&buf[0..4]),
            after_crypt_len: from_bytes_le(&buf[4..8]),
            after_compress_len: from_bytes_le(&buf[8..12]),
            real_len: from_bytes_le(&buf[12..16]),
        }
    }

    fn write(&self, buf: &mut [u8]) {
        to_bytes_le(self.fourcc, &mut buf[0..4]);
        to_bytes_le(self.after_crypt_len, &mut buf[4..8]);
        to_bytes_le(self.after_compress_len, &mut buf[8..12]);
        to_bytes_le(self.real_len, &mut buf[12..16]);
    }
}

/// Read just the FourCC tag out of an encoded CryptedObject, without
/// validating anything else. Used by callers (Proto, EterPack) that must
/// resolve a concrete [`Compressor`] from a registry before calling
/// [`decode`].
pub fn peek_fourcc(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < HEADER_SIZE + MAGIC_SIZE {
        return None;
    }
    Some(from_bytes_le(&bytes[0..4]))
}

/// Decode a CryptedObject buffer, verifying the header and every
/// cryptation/compression boundary against `algorithm` and `keys`.
///
/// `algorithm` must be the compressor the object was originally encoded
/// with; `decode` checks this against the header's `fourcc` field but
/// does not look the algorithm up itself (see [`decode_with_registry`]
/// for that).
pub fn decode(
    bytes: &[u8],
    algorithm: &dyn Compressor,
    keys: &[u32; 4],
) -> Result<Vec<u8>, CryptedObjectError> {
    if bytes.len() < HEADER_SIZE + MAGIC_SIZE {
        return Err(CryptedObjectError::InvalidInput);
    }

    let header = Header::parse(bytes);
    if header.real_len == 0 || header.fourcc != algorithm.fourcc() {
        return Err(CryptedObjectError::InvalidHeader);
    }

    let n = bytes.len();
    let body = &bytes[HEADER_SIZE..];

    // 1. Cryptation stage.
    let mut crypt_plain: Vec<u8> = Vec::new();
    if header.after_crypt_len > 0 {
        // Preserved verbatim: one magic word of slack beyond the
        // encrypted-region length (spec.md §9 open question).
        if (n - HEADER_SIZE) as u32 != header.after_crypt_len + MAGIC_SIZE as u32 {
            return Err(CryptedObjectError::InvalidCryptLength);
        }

        let plain_len = header.after_compress_len as usize + XTEA_ROUNDS_CUSHION;
        crypt_plain = vec![0u8; plain_len];
        xtea::decrypt(body, &mut crypt_plain, header.after_crypt_len as usize, keys);

        if from_bytes_le(&crypt_plain[0..4]) != header.fourcc {
            return Err(CryptedObjectError::CryptFail);
        }
    }

    // 2. Decompression stage.
    if header.after_compress_len > 0 {
        if !algorithm.supports_encryption() && header.after_crypt_len > 0 {
            return Err(CryptedObjectError::InvalidCryptAlgorithm);
        }

        let input_data: &[u8] = if header.after_crypt_len < 1 {
            if (n - HEADER_SIZE) as u32 != header.after_compress_len + MAGIC_SIZE as u32 {
                return Err(CryptedObjectError::InvalidCompressLength);
            }
            if from_bytes_le(&body[0..4]) != header.fourcc {
                return Err(CryptedObjectError::InvalidFourCC);
            }
            &body[MAGIC_SIZE..MAGIC_SIZE + header.after_compress_len as usize]
        } else {
            &crypt_plain[MAGIC_SIZE..MAGIC_SIZE + header.after_compress_len as usize]
        };

        let decompressed = algorithm
            .decompress(input_data, header.real_len as usize)
            .map_err(|_| CryptedObjectError::CompressFail)?;
        if decompressed.len() as u32 != header.real_len {
            return Err(CryptedObjectError::InvalidRealLength);
        }
        return Ok(decompressed);
    }

    // 3. Identity stage (compression disabled entirely).
    if (n - HEADER_SIZE) as u32 != header.real_len {
        return Err(CryptedObjectError::InvalidRealLength);
    }
    Ok(body[..header.real_len as usize].to_vec())
}

/// Resolve `algorithm` from `registry` using the FourCC embedded in
/// `bytes`, then [`decode`]. Fails with [`CryptedObjectError::
/// InvalidAlgorithm`] if that FourCC is not registered.
pub fn decode_with_registry(
    bytes: &[u8],
    registry: &AlgorithmRegistry,
    keys: &[u32; 4],
) -> Result<Vec<u8>, CryptedObjectError> {
    let fourcc = peek_fourcc(bytes).ok_or(CryptedObjectError::InvalidInput)?;
    let algorithm = registry
        .find(fourcc)
        .ok_or(CryptedObjectError::InvalidAlgorithm)?;
    decode(bytes, algorithm, keys)
}

/// Encode `input` as a CryptedObject using `algorithm` and, for
/// [`Mode::CompressAndEncrypt`], `keys`.
pub fn encode(
    input: &[u8],
    algorithm: &dyn Compressor,
    keys: &[u32; 4],
    mode: Mode,
) -> Result<Vec<u8>, CryptedObjectError> {
    if input.is_empty() {
        return Err(CryptedObjectError::InvalidInput);
    }

    let mut header = Header {
        fourcc: algorithm.fourcc(),
        after_crypt_len: 0,
        after_compress_len: 0,
        real_len: input.len() as u32,
    };

    let body: Vec<u8> = match mode {
        Mode::None => input.to_vec(),
        Mode::CompressOnly | Mode::CompressAndEncrypt => {
            let compressed = algorithm
                .compress(input)
                .map_err(|_| CryptedObjectError::CompressFail)?;
            header.after_compress_len = compressed.len() as u32;

            let mut magic_plus_compressed = Vec::with_capacity(MAGIC_SIZE + compressed.len());
            magic_plus_compressed.extend_from_slice(&header.fourcc.to_le_bytes());
            magic_plus_compressed.extend_from_slice(&compressed);

            if mode == Mode::CompressAndEncrypt && algorithm.supports_encryption() {
                header.after_crypt_len = header.after_compress_len + XTEA_ROUNDS_CUSHION as u32;
                // XTEA reads whole 8-byte blocks up to after_crypt_len, which
                // is magic_plus_compressed.len() plus a 16-byte cushion, so
                // the plaintext buffer must be padded out to that size
                // before it is handed to xtea::encrypt.
                let mut plain = vec![0u8; header.after_crypt_len as usize];
                plain[..magic_plus_compressed.len()].copy_from_slice(&magic_plus_compressed);
                let mut cipher = vec![0u8; header.after_crypt_len as usize];
                xtea::encrypt(&plain, &mut cipher, header.after_crypt_len as usize, keys);
                cipher
            } else {
                magic_plus_compressed
            }
        }
    };

    let mut out = vec![0u8; HEADER_SIZE + body.len()];
    header.write(&mut out[..HEADER_SIZE]);
    out[HEADER_SIZE..].copy_from_slice(&body);
    Ok(out)
}
