use packtea::config::{Config, DEFAULT_KEYS};
use packtea::crypted_object::{self, Mode};
use packtea::eterpack::{EterPack, StorageType};
use packtea::proto::{self, ProtoVariant};
use packtea::{Lzo1xCompressor, SnappyCompressor};
use std::fs::File;
use std::io::{Read, Write};
use tempfile::NamedTempFile;

// S1: empty-payload rejection.
#[test]
fn s1_empty_payload_rejection() {
    let algo = Lzo1xCompressor::default();
    assert!(crypted_object::encode(b"", &algo, &DEFAULT_KEYS, Mode::None).is_err());
    assert!(crypted_object::decode(&[0u8; 19], &algo, &DEFAULT_KEYS).is_err());
}

// S2: identity round-trip, exact on-wire bytes.
#[test]
fn s2_identity_roundtrip_exact_bytes() {
    let algo = Lzo1xCompressor::default();
    let encoded = crypted_object::encode(b"hello", &algo, &DEFAULT_KEYS, Mode::None).unwrap();
    assert_eq!(encoded.len(), 21);
    assert_eq!(&encoded[0..4], &[0x4D, 0x43, 0x4F, 0x5A]);
    assert_eq!(
        crypted_object::decode(&encoded, &algo, &DEFAULT_KEYS).unwrap(),
        b"hello"
    );
}

// S3: compress-only round-trip with a flipped embedded magic.
#[test]
fn s3_compress_only_wrong_magic_fails() {
    let algo = Lzo1xCompressor::default();
    let mut encoded =
        crypted_object::encode(b"hello", &algo, &DEFAULT_KEYS, Mode::CompressOnly).unwrap();
    encoded[16] ^= 0xFF;
    assert!(crypted_object::decode(&encoded, &algo, &DEFAULT_KEYS).is_err());
}

// S4: full pipeline round-trip with the archive-index default keys and Snappy.
#[test]
fn s4_full_pipeline_roundtrip() {
    let algo = SnappyCompressor::default();
    let data: Vec<u8> = (0..1024)
        .map(|i| if i % 2 == 0 { 0xAA } else { 0x55 })
        .collect();
    let encoded =
        crypted_object::encode(&data, &algo, &DEFAULT_KEYS, Mode::CompressAndEncrypt).unwrap();
    let decoded = crypted_object::decode(&encoded, &algo, &DEFAULT_KEYS).unwrap();
    assert_eq!(decoded, data);
}

// S5: EterPack reload on real files, matching the teacher's tempfile-based
// archive round-trip test.
#[test]
fn s5_eterpack_reload_on_disk() {
    let eix_file = NamedTempFile::new().unwrap();
    let epk_file = NamedTempFile::new().unwrap();
    let config = Config::default();

    let icon = vec![0x42u8; 3000];
    let gui = b"a raw gui blob, stored uncompressed".to_vec();

    {
        let body = File::options()
            .write(true)
            .read(true)
            .open(epk_file.path())
            .unwrap();
        let mut pack = EterPack::create(body, config.clone());
        pack.put("icon.tga", &icon, StorageType::CryptedObjectSnappy)
            .unwrap();
        pack.put("gui.sub", &gui, StorageType::Uncompressed)
            .unwrap();
        let index_bytes = pack.save();
        File::create(eix_file.path())
            .unwrap()
            .write_all(&index_bytes)
            .unwrap();
    }

    {
        let mut index_bytes = Vec::new();
        File::open(eix_file.path())
            .unwrap()
            .read_to_end(&mut index_bytes)
            .unwrap();
        let body = File::options()
            .write(true)
            .read(true)
            .open(epk_file.path())
            .unwrap();
        let mut pack = EterPack::load(&index_bytes, body, config).unwrap();

        assert_eq!(pack.get("icon.tga").unwrap(), icon);
        assert_eq!(pack.get("gui.sub").unwrap(), gui);

        let info = pack.info("icon.tga").unwrap();
        assert_eq!(info.storage_type, StorageType::CryptedObjectSnappy as u8);
        assert_eq!(info.real_size, icon.len() as u32);

        let gui_info = pack.info("gui.sub").unwrap();
        assert_eq!(gui_info.storage_type, StorageType::Uncompressed as u8);
        assert_eq!(gui_info.crc32, packtea::util::crc32(&gui));
    }
}

// S6: index CRC tolerance — a corrupted filename CRC is silently dropped,
// not a hard failure.
#[test]
fn s6_index_crc_tolerance_on_disk() {
    use std::io::Cursor;

    let config = Config::default();
    let mut pack = EterPack::create(Cursor::new(Vec::<u8>::new()), config.clone());
    pack.put("good.txt", b"alpha", StorageType::Uncompressed)
        .unwrap();
    pack.put("bad.txt", b"beta", StorageType::Uncompressed)
        .unwrap();

    let mut index_bytes = pack.save();
    let corrupt_offset = packtea::eterpack::HEADER_SIZE + packtea::eterpack::ENTRY_SIZE + 168;
    index_bytes[corrupt_offset] ^= 0xFF;

    let reloaded = EterPack::load(&index_bytes, pack.into_body(), config).unwrap();
    assert_eq!(reloaded.files().count(), 1);
}

// Proto round-trip exercising the ItemProto (MIPX) header shape end to end.
#[test]
fn proto_item_roundtrip() {
    let config = Config::default();
    let algo = Lzo1xCompressor::default();
    let table = b"record-one".repeat(5);

    let encoded = proto::encode(
        &table,
        ProtoVariant::ItemProto,
        5,
        &config.proto_fourccs(),
        3,
        256,
        &algo,
        &config.keys,
        Mode::CompressAndEncrypt,
    )
    .unwrap();

    let decoded = proto::decode(&encoded, &config.proto_fourccs(), &algo, &config.keys).unwrap();
    assert_eq!(decoded.elements, 5);
    assert_eq!(decoded.version, 3);
    assert_eq!(decoded.stride, 256);
    assert_eq!(decoded.payload, table);
}
