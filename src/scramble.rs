//! MySQL 4.1 (`mysql_native_password`) password math.
//!
//! ```text
//! stored   = SHA1(SHA1(password))
//! response = SHA1(password) XOR SHA1(salt + stored)
//! ```
//!
//! The server never sees the password: it recovers `SHA1(password)` from the
//! response and checks that hashing it again yields `stored`.

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::error::{XAuthError, XAuthResult};

/// Length of a SHA1 digest, and so of both the stored hash and the response.
pub const HASH_LENGTH: usize = 20;

/// Stored hash as kept in an account table: `SHA1(SHA1(password))`.
pub type PasswordHash = [u8; HASH_LENGTH];

fn xor(a: &[u8], b: &[u8]) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) {
        *o = x ^ y;
    }
    out
}

/// Compute the stored hash for a plaintext password.
pub fn password_hash(password: &[u8]) -> PasswordHash {
    let stage1 = Sha1::digest(password);
    Sha1::digest(stage1).into()
}

/// Render a stored hash the way `mysql.user.authentication_string` does.
pub fn encode_password_hash(hash: &PasswordHash) -> String {
    format!("*{}", hex::encode_upper(hash))
}

/// Parse a `*HEX` hash. The empty string means "no password".
pub fn decode_password_hash(encoded: &str) -> XAuthResult<Option<PasswordHash>> {
    if encoded.is_empty() {
        return Ok(None);
    }
    let digits = encoded
        .strip_prefix('*')
        .ok_or_else(|| XAuthError::InvalidPasswordHash("missing '*' prefix".to_string()))?;
    let mut hash = [0u8; HASH_LENGTH];
    hex::decode_to_slice(digits, &mut hash)
        .map_err(|e| XAuthError::InvalidPasswordHash(e.to_string()))?;
    Ok(Some(hash))
}

/// Client side: scramble `password` with the server's `salt`.
pub fn scramble_password(password: &[u8], salt: &[u8]) -> [u8; HASH_LENGTH] {
    let stage1 = Sha1::digest(password);
    let stage2 = Sha1::digest(stage1);

    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(stage2);
    let stage3 = hasher.finalize();

    xor(&stage1, &stage3)
}

/// Server side: does `response` prove knowledge of the password behind `stored`?
pub fn check_scrambled_password(salt: &[u8], stored: &PasswordHash, response: &[u8]) -> bool {
    if response.len() != HASH_LENGTH {
        return false;
    }

    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(stored);
    let stage3 = hasher.finalize();

    let candidate = xor(response, &stage3);
    let computed = Sha1::digest(candidate);

    computed.as_slice().ct_eq(stored.as_slice()).into()
}

/// Decode an X protocol secret: `*` followed by 40 hex digits.
///
/// The raw 20-byte scramble is not accepted: it may contain NUL, which the
/// continue payload uses as its field separator.
pub fn decode_secret(secret: &[u8]) -> Option<[u8; HASH_LENGTH]> {
    let digits = secret.strip_prefix(b"*")?;
    let mut raw = [0u8; HASH_LENGTH];
    hex::decode_to_slice(digits, &mut raw).ok()?;
    Some(raw)
}

/// Client side, X protocol form: `*` + uppercase hex, or empty for no password.
pub fn encode_secret(password: &[u8], salt: &[u8]) -> String {
    if password.is_empty() {
        return String::new();
    }
    format!("*{}", hex::encode_upper(scramble_password(password, salt)))
}
