//! # Credenciales
//! src/auth/password.rs
//!
//! Hash de passwords con SHA-256 y salt, tokens de sesión y validación de
//! los datos de registro.

use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Largo del salt por usuario
pub const SALT_LENGTH: usize = 32;

/// Largo de un token de sesión
pub const TOKEN_LENGTH: usize = 63;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 63;
pub const MIN_EMAIL_LEN: usize = 5;
pub const MAX_EMAIL_LEN: usize = 127;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 255;

fn random_alphanumeric(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Genera un salt alfanumérico aleatorio
pub fn generate_salt() -> String {
    random_alphanumeric(SALT_LENGTH)
}

/// Genera un token de sesión alfanumérico aleatorio
pub fn generate_token() -> String {
    random_alphanumeric(TOKEN_LENGTH)
}

/// SHA-256 en hexadecimal de `password + salt`
///
/// # Ejemplo
/// ```
/// use ternic_server::auth::password::hash_password;
///
/// let hash = hash_password("Secret123", "salt");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_password("Secret123", "salt"));
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    hash_password(password, salt) == hash
}

/// 3 a 63 caracteres alfanuméricos o `_`
pub fn is_valid_username(username: &str) -> bool {
    (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    // Algo antes del `@`; después, un `.` que no esté pegado al `@` ni al final
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@]+@[^.]+\..+$").ok())
        .as_ref()
}

/// Validación simple de formato de email
pub fn is_valid_email(email: &str) -> bool {
    (MIN_EMAIL_LEN..=MAX_EMAIL_LEN).contains(&email.len())
        && email_regex().is_some_and(|re| re.is_match(email))
}

/// 8 a 255 caracteres con al menos 3 de: mayúscula, minúscula, dígito, otro
pub fn is_strong_password(password: &str) -> bool {
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len()) {
        return false;
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    [has_upper, has_lower, has_digit, has_special]
        .iter()
        .filter(|present| **present)
        .count()
        >= 3
}
