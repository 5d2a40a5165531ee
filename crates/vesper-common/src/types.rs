//! Key-type tags for indexed attributes.

use serde::{Deserialize, Serialize};

/// Width in bytes of a string index key. Longer attribute values are
/// truncated to this length when the key is formed; shorter values are
/// right-padded with NUL bytes.
pub const STR_KEY_LEN: usize = 10;

/// Tag identifying the domain of an indexed attribute.
///
/// The tag is persisted in the index header page and fixed for the lifetime
/// of an index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyType {
    /// 32-bit signed integer, natural ordering.
    Int = 0,
    /// 64-bit IEEE-754 double, natural ordering. NaN is not a valid key.
    Double = 1,
    /// Fixed-width ASCII string, bytewise ordering.
    Str = 2,
}

impl KeyType {
    /// Byte width of a key of this type on disk.
    pub fn key_size(&self) -> usize {
        match self {
            KeyType::Int => 4,
            KeyType::Double => 8,
            KeyType::Str => STR_KEY_LEN,
        }
    }

    /// Decodes a persisted tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(KeyType::Int),
            1 => Some(KeyType::Double),
            2 => Some(KeyType::Str),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KeyType::Int => "INT",
            KeyType::Double => "DOUBLE",
            KeyType::Str => "STRING",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_sizes() {
        assert_eq!(KeyType::Int.key_size(), 4);
        assert_eq!(KeyType::Double.key_size(), 8);
        assert_eq!(KeyType::Str.key_size(), STR_KEY_LEN);
    }

    #[test]
    fn test_tag_roundtrip() {
        for key_type in [KeyType::Int, KeyType::Double, KeyType::Str] {
            assert_eq!(KeyType::from_tag(key_type as u8), Some(key_type));
        }
        assert_eq!(KeyType::from_tag(3), None);
        assert_eq!(KeyType::from_tag(255), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyType::Int.to_string(), "INT");
        assert_eq!(KeyType::Double.to_string(), "DOUBLE");
        assert_eq!(KeyType::Str.to_string(), "STRING");
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = KeyType::Double;
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: KeyType = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
