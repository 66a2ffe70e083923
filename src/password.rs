use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{RepoResult, RepositoryError};

/// Hashes `password` into a PHC string with a fresh salt.
pub fn hash(password: &str) -> RepoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RepositoryError::PasswordHash(e.to_string()))
}

/// Malformed stored hashes verify as false.
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_hashed_password() {
        let hashed = hash("abcd1A23").unwrap();

        assert!(hashed.starts_with("$argon2"));
        assert!(verify("abcd1A23", &hashed));
        assert!(!verify("0987654321", &hashed));
    }

    #[test]
    fn plain_text_is_not_a_hash() {
        assert!(!verify("secret", "secret"));
    }
}
