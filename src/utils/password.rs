//! Argon2id hashing for login passwords.
//!
//! Raw passwords travel inside [`Password`], whose `Debug` output is
//! redacted so a stray log line cannot leak one.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub struct Password(String);

impl Password {
    pub fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// A PHC-encoded Argon2 hash as stored on the principal row.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(PasswordHashString(hash.to_string()))
}

/// Check a presented password against a stored hash. The error does not
/// distinguish a mismatch from an unparseable hash.
pub fn verify_password(
    password: &Password,
    stored: &PasswordHashString,
) -> Result<(), anyhow::Error> {
    let parsed = PasswordHash::new(stored.as_str())
        .map_err(|e| anyhow::anyhow!("Stored hash is not a valid PHC string: {}", e))?;
    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .map_err(|_| anyhow::anyhow!("Password mismatch"))
}
