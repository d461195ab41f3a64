//! Internal helpers for validation, hashing and identifiers.
//!
//! These utilities are **not** part of the public API.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use sha2::{Digest, Sha256};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const PUBLIC_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub(crate) const PUBLIC_ID_LEN: usize = 6;

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.nfc().collect())
}

/// Case and accent insensitive key used for uniqueness checks.
pub(crate) fn name_key(value: &str) -> String {
    value
        .trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(EngineError::InvalidInput(format!("invalid email: {value}")));
    }
    Ok(email)
}

/// Member codes are typed by hand at the counter, so lookups ignore case and
/// surrounding whitespace.
pub(crate) fn normalize_member_code(value: &str) -> ResultEngine<String> {
    let code = value.trim().to_uppercase();
    if code.is_empty() {
        return Err(EngineError::InvalidInput(
            "member code is required".to_string(),
        ));
    }
    Ok(code)
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn new_public_id() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(PUBLIC_ID_LEN)
        .map(|b| PUBLIC_ID_ALPHABET[usize::from(*b) % PUBLIC_ID_ALPHABET.len()] as char)
        .collect()
}

/// A fresh random token (64 hex characters).
pub(crate) fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub(crate) fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with Argon2id into a PHC string (`$argon2id$v=19$...`).
pub(crate) fn hash_password(password: &str) -> ResultEngine<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

/// Checks `password` against a stored PHC string. Unparsable hashes never
/// verify.
pub(crate) fn verify_password(stored: &str, password: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_ids_are_short_uppercase_codes() {
        let id = new_public_id();
        assert_eq!(id.len(), PUBLIC_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let stored = hash_password("correct horse").unwrap();
        assert!(verify_password(&stored, "correct horse"));
        assert!(!verify_password(&stored, "wrong horse"));
        assert!(!verify_password("garbage", "correct horse"));
    }

    #[test]
    fn password_hashes_are_salted_argon2id() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password(&second, "correct horse"));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(hash_password("short").is_err());
    }

    #[test]
    fn name_key_ignores_case_and_accents() {
        assert_eq!(name_key(" Café "), name_key("CAFE"));
    }

    #[test]
    fn email_must_have_a_domain() {
        assert_eq!(normalize_email(" Ana@Example.org ").unwrap(), "ana@example.org");
        assert!(normalize_email("ana").is_err());
        assert!(normalize_email("@example.org").is_err());
    }
}
