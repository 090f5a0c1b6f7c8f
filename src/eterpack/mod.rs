//! EterPack — a fixed-width directory (`.eix`) over a concatenated body
//! stream (`.epk`).
//!
//! The index is a 12-byte header followed by `elements` fixed 192-byte
//! entries (spec.md §3); the body is whatever blobs `Put` appended, read
//! back by `position`/`size`. Grounded on
//! `original_source/src/EterPack.cpp` (`EterPack::Load`/`Get`/`Put`/
//! `Save`, `DecryptType`).

use crate::compressor::{Compressor, Lzo1xCompressor, SnappyCompressor};
use crate::config::Config;
use crate::crypted_object::{self, CryptedObjectError, Mode};
use crate::util::{crc32, crc32_filename, from_bytes_le, to_bytes_le};
use rand::RngCore;
use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;

/// Byte length of one directory entry.
pub const ENTRY_SIZE: usize = 192;
/// Byte length of the index header.
pub const HEADER_SIZE: usize = 12;
/// Maximum stored filename length, including the NUL terminator.
pub const FILENAME_FIELD_SIZE: usize = 161;

#[derive(Error, Debug)]
pub enum EterPackError {
    #[error("index buffer shorter than the 12-byte header")]
    InvalidInput,
    #[error("index FourCC does not match the configured EPKD tag")]
    InvalidFourCC,
    #[error("index version does not match the configured version")]
    VersionMismatch,
    #[error("declared element count does not match the index buffer length")]
    SizeMismatch,
    #[error("stored size does not match the recorded real_size for an identity entry")]
    RealSizeMismatch,
    #[error("storage type {0} is reserved and unsupported")]
    UnsupportedStorageType(u8),
    #[error("no entry registered for that filename")]
    NotFound,
    #[error("filename does not fit the 160-byte field")]
    FilenameTooLong,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("embedded CryptedObject failed: {0}")]
    Object(#[from] CryptedObjectError),
}

/// Storage kind recorded in an entry's `type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Uncompressed = 0,
    CryptedObjectLzo1x = 1,
    CryptedObjectLzo1xXtea = 2,
    CryptedObjectSnappy = 6,
}

impl StorageType {
    fn from_byte(b: u8) -> Result<Self, EterPackError> {
        match b {
            0 => Ok(StorageType::Uncompressed),
            1 => Ok(StorageType::CryptedObjectLzo1x),
            2 => Ok(StorageType::CryptedObjectLzo1xXtea),
            6 => Ok(StorageType::CryptedObjectSnappy),
            3..=5 => Err(EterPackError::UnsupportedStorageType(b)),
            other => Err(EterPackError::UnsupportedStorageType(other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EterPackEntry {
    pub id: u32,
    pub filename: String,
    pub filename_crc32: u32,
    pub real_size: u32,
    pub size: u32,
    pub crc32: u32,
    pub position: u32,
    pub storage_type: u8,
}

/// Blanket file-system interface EterPack reads/writes its body through;
/// any `Read + Write + Seek` implements it (a `File`, a `Cursor<Vec<u8>>`,
/// etc). Mirrors spec.md §6's `seek`/`read`/`write`/`tell` contract.
pub trait PackFs: Read + Write + Seek {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}
impl<T: Read + Write + Seek> PackFs for T {}

fn write_entry(entry: &EterPackEntry, out: &mut [u8; ENTRY_SIZE], rng: &mut dyn RngCore) {
    to_bytes_le(entry.id, &mut out[0..4]);
    let name_bytes = entry.filename.as_bytes();
    out[4..4 + name_bytes.len()].copy_from_slice(name_bytes);
    out[4 + name_bytes.len()] = 0; // NUL terminator
    for b in &mut out[4 + name_bytes.len() + 1..165] {
        *b = 0;
    }
    rng.fill_bytes(&mut out[165..168]);
    to_bytes_le(entry.filename_crc32, &mut out[168..172]);
    to_bytes_le(entry.real_size, &mut out[172..176]);
    to_bytes_le(entry.size, &mut out[176..180]);
    to_bytes_le(entry.crc32, &mut out[180..184]);
    to_bytes_le(entry.position, &mut out[184..188]);
    out[188] = entry.storage_type;
    rng.fill_bytes(&mut out[189..192]);
}

fn parse_entry(buf: &[u8; ENTRY_SIZE]) -> EterPackEntry {
    let id = from_bytes_le(&buf[0..4]);
    let name_region = &buf[4..165];
    let nul = name_region.iter().position(|&b| b == 0).unwrap_or(161);
    let filename = String::from_utf8_lossy(&name_region[..nul]).into_owned();
    EterPackEntry {
        id,
        filename,
        filename_crc32: from_bytes_le(&buf[168..172]),
        real_size: from_bytes_le(&buf[172..176]),
        size: from_bytes_le(&buf[176..180]),
        crc32: from_bytes_le(&buf[180..184]),
        position: from_bytes_le(&buf[184..188]),
        storage_type: buf[188],
    }
}

/// In-memory directory, backed by a caller-supplied body stream for
/// `get`/`put`.
pub struct EterPack<F: PackFs> {
    config: Config,
    fs: F,
    entries: HashMap<u32, EterPackEntry>,
    next_id: u32,
}

impl<F: PackFs> EterPack<F> {
    /// Start an empty archive over `fs`, positioned at the start of the
    /// body stream.
    pub fn create(fs: F, config: Config) -> Self {
        Self {
            config,
            fs,
            entries: HashMap::new(),
            next_id: 0,
        }
    }

    /// Consume this archive and hand back its body stream (e.g. to flush
    /// it to disk after [`Self::save`]).
    pub fn into_body(self) -> F {
        self.fs
    }

    /// Parse `index_bytes` (typically the plaintext output of a
    /// CryptedObject decode) and attach `fs` as the body stream for
    /// subsequent `get` calls.
    pub fn load(index_bytes: &[u8], fs: F, config: Config) -> Result<Self, EterPackError> {
        if index_bytes.len() < HEADER_SIZE {
            return Err(EterPackError::InvalidInput);
        }
        let fourcc = from_bytes_le(&index_bytes[0..4]);
        if fourcc != config.epkd_fourcc {
            return Err(EterPackError::InvalidFourCC);
        }
        let version = from_bytes_le(&index_bytes[4..8]);
        if version != config.eterpack_version {
            return Err(EterPackError::VersionMismatch);
        }
        let elements = from_bytes_le(&index_bytes[8..12]) as usize;
        if elements * ENTRY_SIZE != index_bytes.len() - HEADER_SIZE {
            return Err(EterPackError::SizeMismatch);
        }

        let mut entries = HashMap::new();
        let mut max_id = 0u32;
        for i in 0..elements {
            let start = HEADER_SIZE + i * ENTRY_SIZE;
            let chunk: &[u8; ENTRY_SIZE] = index_bytes[start..start + ENTRY_SIZE]
                .try_into()
                .expect("slice is exactly ENTRY_SIZE bytes");
            let entry = parse_entry(chunk);

            // Index tolerance (spec.md §4.6/§7): silently skip entries
            // whose filename CRC does not match the stored filename.
            if crc32_filename(&entry.filename) != entry.filename_crc32 {
                continue;
            }
            max_id = max_id.max(entry.id);
            entries.insert(entry.filename_crc32, entry);
        }

        Ok(Self {
            config,
            fs,
            next_id: if entries.is_empty() { 0 } else { max_id + 1 },
            entries,
        })
    }

    /// Surviving entries after a [`Self::load`], in no particular order
    /// (spec.md §8 S6: entries failing the filename-CRC check never
    /// appear here).
    pub fn files(&self) -> impl Iterator<Item = &EterPackEntry> {
        self.entries.values()
    }

    pub fn info(&self, filename: &str) -> Option<&EterPackEntry> {
        self.entries.get(&crc32_filename(filename))
    }

    /// Read and decode the body bytes for `filename`.
    pub fn get(&mut self, filename: &str) -> Result<Vec<u8>, EterPackError> {
        let entry = self
            .entries
            .get(&crc32_filename(filename))
            .ok_or(EterPackError::NotFound)?
            .clone();

        self.fs.seek(SeekFrom::Start(entry.position as u64))?;
        let mut stored = vec![0u8; entry.size as usize];
        self.fs.read_exact(&mut stored)?;

        decrypt_type(&stored, &entry, &self.config)
    }

    /// Compress/encrypt `data` per `storage_type`, append it to the body
    /// stream, and register a directory entry for `filename`. Overwrites
    /// any previous entry with the same filename (last-writer-wins, per
    /// spec.md §3).
    pub fn put(
        &mut self,
        filename: &str,
        data: &[u8],
        storage_type: StorageType,
    ) -> Result<(), EterPackError> {
        let lower = filename.to_ascii_lowercase();
        if lower.len() + 1 > FILENAME_FIELD_SIZE {
            return Err(EterPackError::FilenameTooLong);
        }

        let stored = encrypt_type(data, storage_type, &self.config)?;
        self.fs.write_all(&stored)?;
        let end = self.fs.tell()?;
        let position = end - stored.len() as u64;

        let entry = EterPackEntry {
            id: self.next_id,
            filename_crc32: crc32_filename(&lower),
            real_size: data.len() as u32,
            size: stored.len() as u32,
            crc32: crc32(&stored),
            position: position as u32,
            storage_type: storage_type as u8,
            filename: lower,
        };
        self.next_id += 1;
        self.entries.insert(entry.filename_crc32, entry);
        Ok(())
    }

    /// Serialize the header and every entry (random 3-byte padding per
    /// entry, spec.md §4.6) into an index image.
    pub fn save(&self) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let mut out = vec![0u8; HEADER_SIZE + self.entries.len() * ENTRY_SIZE];
        to_bytes_le(self.config.epkd_fourcc, &mut out[0..4]);
        to_bytes_le(self.config.eterpack_version, &mut out[4..8]);
        to_bytes_le(self.entries.len() as u32, &mut out[8..12]);

        for (i, entry) in self.entries.values().enumerate() {
            let start = HEADER_SIZE + i * ENTRY_SIZE;
            let chunk: &mut [u8; ENTRY_SIZE] = (&mut out[start..start + ENTRY_SIZE])
                .try_into()
                .expect("slice is exactly ENTRY_SIZE bytes");
            write_entry(entry, chunk, &mut rng);
        }
        out
    }
}

fn encrypt_type(
    data: &[u8],
    storage_type: StorageType,
    config: &Config,
) -> Result<Vec<u8>, EterPackError> {
    match storage_type {
        StorageType::Uncompressed => Ok(data.to_vec()),
        StorageType::CryptedObjectLzo1x => {
            let algo = Lzo1xCompressor::new(config.lzo1x_fourcc);
            Ok(crypted_object::encode(
                data,
                &algo,
                &config.keys,
                Mode::CompressOnly,
            )?)
        }
        StorageType::CryptedObjectLzo1xXtea => {
            let algo = Lzo1xCompressor::new(config.lzo1x_fourcc);
            Ok(crypted_object::encode(
                data,
                &algo,
                &config.keys,
                Mode::CompressAndEncrypt,
            )?)
        }
        StorageType::CryptedObjectSnappy => {
            let algo = SnappyCompressor::new(config.snappy_fourcc);
            Ok(crypted_object::encode(
                data,
                &algo,
                &config.keys,
                Mode::CompressAndEncrypt,
            )?)
        }
    }
}

fn decrypt_type(
    stored: &[u8],
    entry: &EterPackEntry,
    config: &Config,
) -> Result<Vec<u8>, EterPackError> {
    match StorageType::from_byte(entry.storage_type)? {
        StorageType::Uncompressed => {
            if stored.len() as u32 != entry.real_size {
                return Err(EterPackError::RealSizeMismatch);
            }
            Ok(stored.to_vec())
        }
        StorageType::CryptedObjectLzo1x => {
            let algo = Lzo1xCompressor::new(config.lzo1x_fourcc);
            let out = crypted_object::decode(stored, &algo, &config.keys)?;
            check_real_size(out, entry)
        }
        StorageType::CryptedObjectLzo1xXtea => {
            let algo = Lzo1xCompressor::new(config.lzo1x_fourcc);
            let out = crypted_object::decode(stored, &algo, &config.keys)?;
            check_real_size(out, entry)
        }
        StorageType::CryptedObjectSnappy => {
            let algo = SnappyCompressor::new(config.snappy_fourcc);
            let out = crypted_object::decode(stored, &algo, &config.keys)?;
            check_real_size(out, entry)
        }
    }
}

fn check_real_size(out: Vec<u8>, entry: &EterPackEntry) -> Result<Vec<u8>, EterPackError> {
    if out.len() as u32 != entry.real_size {
        return Err(EterPackError::RealSizeMismatch);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn s5_eterpack_reload_roundtrip() {
        let body = Cursor::new(Vec::<u8>::new());
        let mut pack = EterPack::create(body, config());

        let icon = vec![0xAAu8; 2048];
        let gui = b"raw gui blob".to_vec();
        pack.put("icon.tga", &icon, StorageType::CryptedObjectSnappy)
            .unwrap();
        pack.put("gui.sub", &gui, StorageType::Uncompressed).unwrap();

        let index_bytes = pack.save();
        let body = pack.fs;

        let mut reloaded = EterPack::load(&index_bytes, body, config()).unwrap();
        assert_eq!(reloaded.get("icon.tga").unwrap(), icon);
        assert_eq!(reloaded.get("gui.sub").unwrap(), gui);

        let info = reloaded.info("icon.tga").unwrap();
        assert_eq!(info.storage_type, StorageType::CryptedObjectSnappy as u8);
        assert_eq!(info.real_size, icon.len() as u32);
    }

    #[test]
    fn s6_index_crc_tolerance_skips_corrupt_entry() {
        let mut pack = EterPack::create(Cursor::new(Vec::<u8>::new()), config());
        pack.put("good.txt", b"hello", StorageType::Uncompressed)
            .unwrap();
        pack.put("bad.txt", b"world", StorageType::Uncompressed)
            .unwrap();

        let mut index_bytes = pack.save();
        // Corrupt the second entry's filename_crc32 field (offset
        // HEADER_SIZE + ENTRY_SIZE + 168).
        let corrupt_offset = HEADER_SIZE + ENTRY_SIZE + 168;
        index_bytes[corrupt_offset] ^= 0xFF;

        let reloaded = EterPack::load(&index_bytes, pack.fs, config()).unwrap();
        let names: Vec<&str> = reloaded.files().map(|e| e.filename.as_str()).collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn reserved_storage_type_fails_cleanly() {
        assert!(matches!(
            StorageType::from_byte(4),
            Err(EterPackError::UnsupportedStorageType(4))
        ));
    }

    #[test]
    fn put_overwrites_same_filename_last_writer_wins() {
        let mut pack = EterPack::create(Cursor::new(Vec::<u8>::new()), config());
        pack.put("a.txt", b"first", StorageType::Uncompressed)
            .unwrap();
        pack.put("a.txt", b"second", StorageType::Uncompressed)
            .unwrap();
        assert_eq!(pack.get("a.txt").unwrap(), b"second");
        assert_eq!(pack.files().count(), 1);
    }
}
