//! Content hashing
//!
//! Short SHA-256 hashes detect when a catalog changed since a solutions file
//! was written; full hashes identify solution records.

use sha2::{Digest, Sha256};

/// Compute 8-character hex hash of content (first 32 bits of SHA-256).
///
/// # Returns
/// 8-character lowercase hex string (e.g., "a1b2c3d4")
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    // First 4 bytes = 8 hex characters
    hex::encode(&result[..4])
}

/// Full SHA-256 hex digest over a sequence of fields.
///
/// Fields are separated by a NUL byte so that `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
pub fn fields_hash<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_ref().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let hash1 = content_hash(b"hello world");
        let hash2 = content_hash(b"hello world");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 8);
    }

    #[test]
    fn test_content_hash_different_content() {
        let hash1 = content_hash(b"hello");
        let hash2 = content_hash(b"world");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_fields_hash_respects_field_boundaries() {
        assert_ne!(fields_hash(["ab", "c"]), fields_hash(["a", "bc"]));
        assert_eq!(fields_hash(["a", "b"]).len(), 64);
    }
}
