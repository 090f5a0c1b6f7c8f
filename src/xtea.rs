//! XTEA — eXtended Tiny Encryption Algorithm.
//!
//! 64-bit blocks, 128-bit key (four little-endian `u32` words), 32 rounds,
//! delta = `0x9E3779B9`. This is the canonical reference algorithm; see
//! <https://en.wikipedia.org/wiki/XTEA>.
//!
//! # Block truncation
//! Both [`encrypt`] and [`decrypt`] process only `size / 8` whole 64-bit
//! blocks. A trailing partial block (fewer than 8 bytes) is left
//! completely untouched in the output — it is neither encrypted nor
//! zeroed. Every on-wire cryptation region in this crate is sized as
//! `after_compress_len + 20`, which need not be block-aligned, so callers
//! must size their output buffer to at least `size` bytes and not assume
//! the tail is overwritten.
//!
//! # Non-goals
//! XTEA here is an obfuscation layer inherited from the original format,
//! not a confidentiality guarantee. Do not rely on it to resist a
//! motivated attacker with access to the ciphertext.

const DELTA: u32 = 0x9E37_79B9;
const NUM_ROUNDS: u32 = 32;

#[inline]
fn encrypt_block(v0: u32, v1: u32, key: &[u32; 4]) -> (u32, u32) {
    let (mut v0, mut v1) = (v0, v1);
    let mut sum: u32 = 0;
    for _ in 0..NUM_ROUNDS {
        v0 = v0.wrapping_add(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ (sum.wrapping_add(key[(sum & 3) as usize])),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                ^ (sum.wrapping_add(key[((sum >> 11) & 3) as usize])),
        );
    }
    (v0, v1)
}

#[inline]
fn decrypt_block(v0: u32, v1: u32, key: &[u32; 4]) -> (u32, u32) {
    let (mut v0, mut v1) = (v0, v1);
    let mut sum: u32 = DELTA.wrapping_mul(NUM_ROUNDS);
    for _ in 0..NUM_ROUNDS {
        v1 = v1.wrapping_sub(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                ^ (sum.wrapping_add(key[((sum >> 11) & 3) as usize])),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ (sum.wrapping_add(key[(sum & 3) as usize])),
        );
    }
    (v0, v1)
}

/// Encrypt `input[..size]` into `output[..size]` in place of disjoint
/// buffers, `size / 8` blocks at a time. No error channel: malformed
/// sizes simply process fewer blocks.
///
/// # Panics
/// Panics if `input` or `output` is shorter than `size` bytes.
pub fn encrypt(input: &[u8], output: &mut [u8], size: usize, key: &[u32; 4]) {
    let steps = size / 8;
    for i in 0..steps {
        let off = i * 8;
        let v0 = u32::from_le_bytes(input[off..off + 4].try_into().unwrap());
        let v1 = u32::from_le_bytes(input[off + 4..off + 8].try_into().unwrap());
        let (e0, e1) = encrypt_block(v0, v1, key);
        output[off..off + 4].copy_from_slice(&e0.to_le_bytes());
        output[off + 4..off + 8].copy_from_slice(&e1.to_le_bytes());
    }
}

/// Decrypt `input[..size]` into `output[..size]`, `size / 8` blocks at a
/// time. Returns the number of bytes actually written: `8 * (size / 8)`.
///
/// # Panics
/// Panics if `input` or `output` is shorter than `size` bytes.
pub fn decrypt(input: &[u8], output: &mut [u8], size: usize, key: &[u32; 4]) -> usize {
    let steps = size / 8;
    for i in 0..steps {
        let off = i * 8;
        let v0 = u32::from_le_bytes(input[off..off + 4].try_into().unwrap());
        let v1 = u32::from_le_bytes(input[off + 4..off + 8].try_into().unwrap());
        let (d0, d1) = decrypt_block(v0, v1, key);
        output[off..off + 4].copy_from_slice(&d0.to_le_bytes());
        output[off + 4..off + 8].copy_from_slice(&d1.to_le_bytes());
    }
    steps * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u32; 4] = [0x0123_4567, 0x89AB_CDEF, 0xFEDC_BA98, 0x7654_3210];

    #[test]
    fn roundtrip_block_aligned() {
        let plain = b"ABCDEFGHIJKLMNOP".to_vec(); // 16 bytes = 2 blocks
        let mut cipher = vec![0u8; plain.len()];
        encrypt(&plain, &mut cipher, plain.len(), &KEY);
        assert_ne!(cipher, plain);

        let mut decoded = vec![0u8; plain.len()];
        let n = decrypt(&cipher, &mut decoded, cipher.len(), &KEY);
        assert_eq!(n, plain.len());
        assert_eq!(decoded, plain);
    }

    #[test]
    fn trailing_partial_block_is_untouched() {
        let plain = b"0123456789AB".to_vec(); // 12 bytes = 1 block + 4 spare
        let mut cipher = vec![0xFFu8; plain.len()];
        encrypt(&plain, &mut cipher, plain.len(), &KEY);
        // Only the first 8 bytes are touched by encryption.
        assert_eq!(&cipher[8..], &[0xFF; 4]);

        let mut decoded = vec![0xAAu8; plain.len()];
        let n = decrypt(&cipher, &mut decoded, cipher.len(), &KEY);
        assert_eq!(n, 8);
        assert_eq!(&decoded[..8], &plain[..8]);
        assert_eq!(&decoded[8..], &[0xAA; 4]); // untouched tail preserved
    }

    #[test]
    fn empty_input_is_a_noop() {
        let mut out = [0u8; 0];
        assert_eq!(decrypt(&[], &mut out, 0, &KEY), 0);
    }
}
