//! Salted SHA-256 password digests for the bundled in-memory user store.
//!
//! Stored form: `<salt>$<base64(sha256(salt || password))>`.

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub fn hash(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = digest(&salt, password);
    format!("{salt}${digest}")
}

pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let actual = digest(salt, password);

    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}
