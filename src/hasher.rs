//! Tagged Blake3 hashing.
//!
//! Every MWEB hash derivation is domain-separated by a single tag byte
//! written before the payload. The tag set is fixed; no other tags exist.

use blake3::Hasher as Blake3;

/// Domain-separation tags for the Blake3 hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HashTag {
    /// Per-index address key derivation
    Address = b'A',
    /// Pre-switch output blind
    Blind = b'B',
    /// ECDHE shared-secret derivation
    Derive = b'D',
    /// Range-proof private nonce
    Nonce = b'N',
    /// One-time output key tweak
    OutKey = b'O',
    /// Ephemeral send key
    SendKey = b'S',
    /// View tag
    Tag = b'T',
    /// Nonce mask
    NonceMask = b'X',
    /// Value mask
    ValueMask = b'Y',
}

/// Incremental Blake3 hasher with an optional leading tag byte.
pub struct Hasher {
    inner: Blake3,
}

impl Hasher {
    /// An untagged hasher.
    pub fn new() -> Self {
        Self { inner: Blake3::new() }
    }

    /// A hasher whose first input byte is the domain tag.
    pub fn with_tag(tag: HashTag) -> Self {
        let mut inner = Blake3::new();
        inner.update(&[tag as u8]);
        Self { inner }
    }

    /// Append bytes.
    pub fn append(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    /// Append a little-endian u32 (address indices hash this way).
    pub fn append_u32_le(self, value: u32) -> Self {
        self.append(&value.to_le_bytes())
    }

    /// Append a little-endian u64.
    pub fn append_u64_le(self, value: u64) -> Self {
        self.append(&value.to_le_bytes())
    }

    /// Finalize to 32 bytes.
    pub fn finalize(self) -> [u8; 32] {
        *self.inner.finalize().as_bytes()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot untagged hash.
pub fn hashed(data: &[u8]) -> [u8; 32] {
    Hasher::new().append(data).finalize()
}

/// One-shot tagged hash.
pub fn hashed_tag(tag: HashTag, data: &[u8]) -> [u8; 32] {
    Hasher::with_tag(tag).append(data).finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_changes_digest() {
        let data = b"commitment";
        assert_ne!(hashed(data), hashed_tag(HashTag::Blind, data));
        assert_ne!(
            hashed_tag(HashTag::Blind, data),
            hashed_tag(HashTag::Derive, data)
        );
    }

    #[test]
    fn test_tag_byte_is_prefix() {
        // A tagged hash is the plain hash of tag ‖ data.
        let mut buf = vec![b'T'];
        buf.extend_from_slice(b"payload");
        assert_eq!(hashed_tag(HashTag::Tag, b"payload"), hashed(&buf));
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let whole = hashed(b"ab cd");
        let pieces = Hasher::new().append(b"ab ").append(b"cd").finalize();
        assert_eq!(whole, pieces);
    }
}
