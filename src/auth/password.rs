use argon2::{password_hash::Output, Argon2};
use rand::{rngs::OsRng, RngCore};
use tracing::error;

use crate::auth::error::AuthError;

/// Random bytes per salt; the salt is stored as their hex text.
const SALT_BYTES: usize = 8;
/// Length of the derived key in bytes.
const HASH_BYTES: usize = 32;

pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Argon2id over the password, keyed by the salt's hex text.
fn derive(plain: &str, salt: &str) -> Result<[u8; HASH_BYTES], AuthError> {
    let mut out = [0u8; HASH_BYTES];
    Argon2::default()
        .hash_password_into(plain.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password_into error");
            AuthError::Hash(e.to_string())
        })?;
    Ok(out)
}

/// Hash a password with a fresh salt, returning the stored "salt.hash" form.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = generate_salt();
    let hash = derive(plain, &salt)?;
    Ok(format!("{}.{}", salt, hex::encode(hash)))
}

/// Splits a stored password into its salt and hash parts.
pub fn split_stored(stored: &str) -> Result<(&str, &str), AuthError> {
    let is_hex = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit());
    match stored.split_once('.') {
        Some((salt, hash)) if is_hex(salt) && is_hex(hash) => Ok((salt, hash)),
        _ => Err(AuthError::MalformedPassword),
    }
}

/// Recomputes the hash with the stored salt and compares in constant time.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, AuthError> {
    let (salt, stored_hash) = split_stored(stored)?;
    let expected = hex::decode(stored_hash).map_err(|_| AuthError::MalformedPassword)?;
    let expected = Output::new(&expected).map_err(|_| AuthError::MalformedPassword)?;

    let actual = derive(plain, salt)?;
    let actual = Output::new(&actual).map_err(|e| AuthError::Hash(e.to_string()))?;

    // Output's PartialEq does not short-circuit
    Ok(actual == expected)
}
