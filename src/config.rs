//! Explicit, non-singleton configuration.
//!
//! The original implementation reached every FourCC override and key
//! through `Config::Instance()`, a process-wide singleton (see
//! `original_source/src/Config.cpp`). This crate reifies the same set of
//! overrides as a plain owned value, passed explicitly to whatever needs
//! it — no global mutable state.

use crate::proto::ProtoFourCCs;
use crate::util::{fourcc, key_from_hex};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config document is not a JSON object")]
    NotAnObject,
    #[error("field `{0}` is missing or has the wrong type")]
    InvalidField(&'static str),
    #[error("`keys` must be a 32-character uppercase hex string")]
    InvalidKeyHex,
}

/// The archive-index default key from spec.md §8 scenario S4.
pub const DEFAULT_KEYS: [u32; 4] = [0x02B0_9EB9, 0x0581_696F, 0x289B_9863, 0x001A_1879];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub snappy_fourcc: u32,
    pub lzo1x_fourcc: u32,
    pub epkd_fourcc: u32,
    pub item_fourcc: u32,
    pub item_fourcc_old: u32,
    pub mob_fourcc: u32,
    pub item_proto_version: u32,
    pub item_proto_stride: u32,
    pub eterpack_version: u32,
    pub keys: [u32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snappy_fourcc: fourcc("MCSP"),
            lzo1x_fourcc: fourcc("MCOZ"),
            epkd_fourcc: fourcc("EPKD"),
            item_fourcc: fourcc("MIPX"),
            item_fourcc_old: fourcc("MIPT"),
            mob_fourcc: fourcc("MMPT"),
            item_proto_version: 1,
            item_proto_stride: 0,
            eterpack_version: 2,
            keys: DEFAULT_KEYS,
        }
    }
}

impl Config {
    pub fn proto_fourccs(&self) -> ProtoFourCCs {
        ProtoFourCCs {
            item: self.item_fourcc,
            item_old: self.item_fourcc_old,
            mob: self.mob_fourcc,
        }
    }

    /// Parse a minimal JSON document overriding a subset of fields.
    /// Unrecognized fields are ignored; missing fields keep their
    /// [`Config::default`] value. FourCCs are given as 4-character ASCII
    /// strings, `keys` as a 32-character uppercase hex string
    /// (spec.md §6's "Key formats").
    ///
    /// ```json
    /// { "lzo1x_fourcc": "MCOZ", "eterpack_version": 2,
    ///   "keys": "B99EB002 6F69815 ..." }
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ConfigError::NotAnObject)?;
        let object = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let mut config = Config::default();

        let fourcc_field = |object: &serde_json::Map<String, Value>,
                             name: &'static str|
         -> Result<Option<u32>, ConfigError> {
            match object.get(name) {
                None => Ok(None),
                Some(Value::String(s)) if !s.is_empty() => Ok(Some(fourcc(s))),
                Some(_) => Err(ConfigError::InvalidField(name)),
            }
        };
        let u32_field = |object: &serde_json::Map<String, Value>,
                          name: &'static str|
         -> Result<Option<u32>, ConfigError> {
            match object.get(name) {
                None => Ok(None),
                Some(v) => v
                    .as_u64()
                    .map(|n| Some(n as u32))
                    .ok_or(ConfigError::InvalidField(name)),
            }
        };

        if let Some(v) = fourcc_field(object, "snappy_fourcc")? {
            config.snappy_fourcc = v;
        }
        if let Some(v) = fourcc_field(object, "lzo1x_fourcc")? {
            config.lzo1x_fourcc = v;
        }
        if let Some(v) = fourcc_field(object, "epkd_fourcc")? {
            config.epkd_fourcc = v;
        }
        if let Some(v) = fourcc_field(object, "item_fourcc")? {
            config.item_fourcc = v;
        }
        if let Some(v) = fourcc_field(object, "item_fourcc_old")? {
            config.item_fourcc_old = v;
        }
        if let Some(v) = fourcc_field(object, "mob_fourcc")? {
            config.mob_fourcc = v;
        }
        if let Some(v) = u32_field(object, "item_proto_version")? {
            config.item_proto_version = v;
        }
        if let Some(v) = u32_field(object, "item_proto_stride")? {
            config.item_proto_stride = v;
        }
        if let Some(v) = u32_field(object, "eterpack_version")? {
            config.eterpack_version = v;
        }
        if let Some(Value::String(hex_str)) = object.get("keys") {
            config.keys = key_from_hex(hex_str).ok_or(ConfigError::InvalidKeyHex)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_fourccs() {
        let config = Config::default();
        assert_eq!(config.lzo1x_fourcc, fourcc("MCOZ"));
        assert_eq!(config.snappy_fourcc, fourcc("MCSP"));
        assert_eq!(config.epkd_fourcc, fourcc("EPKD"));
        assert_eq!(config.item_fourcc, fourcc("MIPX"));
        assert_eq!(config.item_fourcc_old, fourcc("MIPT"));
        assert_eq!(config.mob_fourcc, fourcc("MMPT"));
        assert_eq!(config.eterpack_version, 2);
        assert_eq!(config.keys, DEFAULT_KEYS);
    }

    #[test]
    fn from_json_str_overrides_only_given_fields() {
        let json = r#"{ "eterpack_version": 3, "lzo1x_fourcc": "XYZZ" }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.eterpack_version, 3);
        assert_eq!(config.lzo1x_fourcc, fourcc("XYZZ"));
        assert_eq!(config.snappy_fourcc, fourcc("MCSP")); // untouched
    }

    #[test]
    fn from_json_str_parses_key_hex() {
        let hex_str = crate::util::key_to_hex(&DEFAULT_KEYS);
        let json = format!(r#"{{ "keys": "{hex_str}" }}"#);
        let config = Config::from_json_str(&json).unwrap();
        assert_eq!(config.keys, DEFAULT_KEYS);
    }

    #[test]
    fn from_json_str_rejects_non_object() {
        assert_eq!(
            Config::from_json_str("[1,2,3]").unwrap_err(),
            ConfigError::NotAnObject
        );
    }

    #[test]
    fn from_json_str_rejects_bad_key_length() {
        let json = r#"{ "keys": "ABCD" }"#;
        assert_eq!(
            Config::from_json_str(json).unwrap_err(),
            ConfigError::InvalidKeyHex
        );
    }
}
