//! One-time codes and opaque credentials.
//!
//! OTP codes, refresh secrets and reset tokens are all stored only as a fast
//! SHA-256 digest. The code space of a 6-digit OTP is too small for hash cost
//! to matter; its protection is the expiry window plus upstream rate
//! limiting. Refresh secrets and reset tokens are high-entropy, so a fast
//! hash is enough there too.

use rand::Rng;
use sha2::{Digest, Sha256};

pub const OTP_CODE_LEN: usize = 6;

/// Uniformly distributed, zero-padded 6-digit code.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:06}", n)
}

/// 256-bit random secret, hex-encoded. Used for refresh secrets and
/// password-reset tokens; the raw value is handed out exactly once.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Fast one-way digest for at-rest comparison.
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}
