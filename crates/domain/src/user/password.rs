//! Password strength rules and Argon2 hashing.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::UserError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()-+=";

/// Checks that a password is long enough and mixes character classes.
pub fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(UserError::WeakPassword(
            "password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(UserError::WeakPassword(
            "password must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(UserError::WeakPassword(
            "password must contain a digit".to_string(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(UserError::WeakPassword(format!(
            "password must contain one of {SPECIAL_CHARACTERS}"
        )));
    }
    Ok(())
}

/// Hashes a password with a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

/// Returns whether `password` matches the stored hash.
///
/// A malformed stored hash is an error, not a mismatch.
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, UserError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserError::PasswordHash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        assert!(validate_password("Sup3r$ecret").is_ok());
    }

    #[test]
    fn each_missing_class_is_reported() {
        for (password, needle) in [
            ("Ab1!", "at least 8"),
            ("lower1!case", "uppercase"),
            ("UPPER1!CASE", "lowercase"),
            ("NoDigits!!", "digit"),
            ("NoSpecial12", "one of"),
        ] {
            let err = validate_password(password).unwrap_err();
            assert!(err.to_string().contains(needle), "{password}: {err}");
        }
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "Sup3r$ecret").unwrap());
        assert!(!verify_password(&hash, "Sup3r$ecret!").unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(
            hash_password("Sup3r$ecret").unwrap(),
            hash_password("Sup3r$ecret").unwrap()
        );
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("not-a-phc-string", "whatever"),
            Err(UserError::PasswordHash(_))
        ));
    }
}
