//! Record identifier generation.
//!
//! Identifiers are a type prefix followed by the base58 encoding of the
//! first 16 bytes of a SHA-256 digest. Random identifiers mix a fresh
//! 16-byte nonce into the digest; derived identifiers hash only their input
//! so the same input always yields the same identifier.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Fill a buffer with random bytes from the thread-local generator.
pub fn fill_random(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Generate a fixed-size array of random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill_random(&mut buf);
    buf
}

/// Deterministic identifier: `{prefix}_` + base58(SHA-256(material)[..16]).
pub fn derived_id(prefix: &str, material: &str) -> String {
    let hash = Sha256::digest(material.as_bytes());
    format!("{prefix}_{}", bs58::encode(&hash[..16]).into_string())
}

/// Fresh identifier: like [`derived_id`] but salted with a random nonce.
pub fn random_id(prefix: &str, material: &str) -> String {
    let nonce: [u8; 16] = random_bytes();
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hasher.update(nonce);
    let hash = hasher.finalize();
    format!("{prefix}_{}", bs58::encode(&hash[..16]).into_string())
}
