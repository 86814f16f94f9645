//! # Password Digests
//!
//! The `drivers` collection stores `password_hash` as the lowercase hex
//! SHA-256 of the plain password, no salt. The dashboard writes the same
//! format, so it cannot change here without a migration on both sides.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `password`.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Checks `password` against a stored digest. Case-insensitive on the digest.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    !stored_hash.is_empty() && hash_password(password).eq_ignore_ascii_case(stored_hash.trim())
}
