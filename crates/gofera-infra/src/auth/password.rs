//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use gofera_core::ports::{AuthError, PasswordService};

/// Argon2-based password service. Hashes are self-describing PHC strings,
/// so hashes produced under different parameters still verify.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Cheap parameters for tests and local fixtures.
    pub fn fast() -> Self {
        let params = Params::new(1024, 1, 1, None).unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = Argon2PasswordService::fast();
        let hash = service.hash("pass1234").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("pass1234", &hash).unwrap());
        assert!(!service.verify("pass12345", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let service = Argon2PasswordService::fast();
        assert_ne!(
            service.hash("pass1234").unwrap(),
            service.hash("pass1234").unwrap()
        );
    }

    #[test]
    fn test_cross_params_verify() {
        let hash = Argon2PasswordService::fast().hash("pass1234").unwrap();
        assert!(Argon2PasswordService::new().verify("pass1234", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        let service = Argon2PasswordService::fast();
        assert!(matches!(
            service.verify("pass1234", "not-a-hash"),
            Err(AuthError::HashingError(_))
        ));
    }
}
