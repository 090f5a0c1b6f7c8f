//! Compressor strategies and the FourCC-keyed algorithm registry.
//!
//! Both built-in compressors delegate to a reference crate ([`rust_lzo`]
//! for LZO1X, [`snap`] for Snappy) the same way the teacher's codec layer
//! delegates to `zstd`/`lz4_flex`/`brotli`/`lzma-rs` — this crate never
//! reimplements the entropy coder, only the container format around it.

mod registry;

pub use registry::AlgorithmRegistry;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompressorError {
    #[error("compression failed")]
    CompressFail,
    #[error("decompression failed (corrupt or truncated input)")]
    DecompressFail,
}

/// A stateless compression strategy identified by a FourCC tag.
///
/// `worst_case(n)` must be an upper bound on `compress(x).len()` for every
/// input `x` of length `n` — callers size their output buffer from it
/// before compressing.
pub trait Compressor: Send + Sync {
    /// The FourCC this compressor is registered and written under.
    fn fourcc(&self) -> u32;

    /// Whether this compressor's output may additionally be passed
    /// through the XTEA cryptation stage. Both built-ins are `true`;
    /// the check exists for algorithms that cannot be combined with
    /// cryptation (spec.md §4.4 step 4's defensive `InvalidCryptAlgorithm`).
    fn supports_encryption(&self) -> bool {
        true
    }

    /// Guaranteed upper bound on `compress(data).len()` for `data.len() ==
    /// n`.
    fn worst_case(&self, n: usize) -> usize;

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressorError>;

    /// Decompress `data`, which is known to expand to exactly
    /// `expected_len` bytes. Returns `CompressorError::DecompressFail` if
    /// the underlying library rejects the stream for any reason,
    /// including a length mismatch.
    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, CompressorError>;
}

// ── LZO1X ────────────────────────────────────────────────────────────────────

/// LZO1X, identified on the wire by FourCC `MCOZ`.
pub struct Lzo1xCompressor {
    fourcc: u32,
}

impl Lzo1xCompressor {
    pub fn new(fourcc: u32) -> Self {
        Self { fourcc }
    }
}

impl Default for Lzo1xCompressor {
    fn default() -> Self {
        Self::new(crate::util::fourcc("MCOZ"))
    }
}

impl Compressor for Lzo1xCompressor {
    fn fourcc(&self) -> u32 {
        self.fourcc
    }

    fn worst_case(&self, n: usize) -> usize {
        n + n / 16 + 64 + 3
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressorError> {
        let mut lzo = rust_lzo::LZOContext::new();
        let mut buf = vec![0u8; self.worst_case(data.len())];
        let error = lzo.compress(data, &mut buf);
        if error != rust_lzo::LZOError::OK {
            return Err(CompressorError::CompressFail);
        }
        Ok(buf)
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, CompressorError> {
        let mut out = vec![0u8; expected_len];
        let (written, error) = rust_lzo::LZOContext::decompress_to_slice(data, &mut out);
        let n = written.len();
        if error != rust_lzo::LZOError::OK {
            return Err(CompressorError::DecompressFail);
        }
        out.truncate(n);
        Ok(out)
    }
}

// ── Snappy ───────────────────────────────────────────────────────────────────

/// Snappy, identified on the wire by FourCC `MCSP`.
pub struct SnappyCompressor {
    fourcc: u32,
}

impl SnappyCompressor {
    pub fn new(fourcc: u32) -> Self {
        Self { fourcc }
    }
}

impl Default for SnappyCompressor {
    fn default() -> Self {
        Self::new(crate::util::fourcc("MCSP"))
    }
}

impl Compressor for SnappyCompressor {
    fn fourcc(&self) -> u32 {
        self.fourcc
    }

    fn worst_case(&self, n: usize) -> usize {
        snap::raw::max_compress_len(n)
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressorError> {
        snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|_| CompressorError::CompressFail)
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, CompressorError> {
        let out = snap::raw::Decoder::new()
            .decompress_vec(data)
            .map_err(|_| CompressorError::DecompressFail)?;
        if out.len() != expected_len {
            return Err(CompressorError::DecompressFail);
        }
        Ok(out)
    }
}
