//! Frame-hash helpers for render determinism tests.
//!
//! Hashing a rendered RGBA buffer gives tests a cheap way to assert "these
//! two renders are pixel-identical" (or deliberately different) without
//! storing image files.

use sha2::{Digest, Sha256};

pub fn rgba_sha256_hex(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}

/// Hash a sequence of frames into per-frame digests.
pub fn frame_hashes<'a>(frames: impl IntoIterator<Item = &'a [u8]>) -> Vec<String> {
    frames.into_iter().map(rgba_sha256_hex).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_buffers_hash_identically() {
        let a = vec![7u8; 64];
        let b = vec![7u8; 64];
        assert_eq!(rgba_sha256_hex(&a), rgba_sha256_hex(&b));
    }

    #[test]
    fn single_byte_change_changes_hash() {
        let a = vec![0u8; 64];
        let mut b = a.clone();
        b[63] = 1;
        assert_ne!(rgba_sha256_hex(&a), rgba_sha256_hex(&b));
    }
}
