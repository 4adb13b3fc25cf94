//! Password hashing and access-token helpers built on `ring`.
//!
//! Stored hashes look like `pbkdf2-sha256$<rounds>$<salt>$<hash>` with the
//! salt and hash in standard base64, so the round count can change without
//! invalidating old accounts.

use std::num::NonZeroU32;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::Rng;
use ring::{digest, pbkdf2};

use crate::error::AuthError;

/// Rounds used for new passwords.
pub const DEFAULT_ROUNDS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(rounds) => rounds,
    None => unreachable!(),
};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;
const TOKEN_LEN: usize = 32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, rounds: NonZeroU32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill(&mut salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, rounds, &salt, password.as_bytes(), &mut hash);

    format!(
        "{SCHEME}${rounds}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    )
}

/// Check a password against a stored hash. A malformed hash is an error,
/// a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let malformed = || AuthError::Hashing("stored password hash is malformed".to_string());

    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(malformed());
    };

    let rounds: NonZeroU32 = rounds.parse().map_err(|_| malformed())?;
    let salt = STANDARD.decode(salt).map_err(|_| malformed())?;
    let hash = STANDARD.decode(hash).map_err(|_| malformed())?;

    Ok(pbkdf2::verify(ALGORITHM, rounds, &salt, password.as_bytes(), &hash).is_ok())
}

/// A fresh random access token, URL-safe base64.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 digest of a token; the only form that is persisted.
pub fn token_digest(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(digest::digest(&digest::SHA256, token.as_bytes()))
}
