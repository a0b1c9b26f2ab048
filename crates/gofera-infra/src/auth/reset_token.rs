//! Password reset tokens: random bytes handed to the user, SHA-256 digest stored.

use rand::RngCore;
use sha2::{Digest, Sha256};

use gofera_core::ports::{ResetToken, ResetTokenService};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256ResetTokenService;

impl ResetTokenService for Sha256ResetTokenService {
    fn generate(&self) -> ResetToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let plain = hex::encode(bytes);
        let digest = self.digest(&plain);
        ResetToken { plain, digest }
    }

    fn digest(&self, plain: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plain.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let service = Sha256ResetTokenService;
        let token = service.generate();

        assert_eq!(token.plain.len(), TOKEN_BYTES * 2);
        assert_eq!(token.digest.len(), 64);
        assert_ne!(token.plain, token.digest);
        assert_eq!(service.digest(&token.plain), token.digest);
    }

    #[test]
    fn test_tokens_differ() {
        let service = Sha256ResetTokenService;
        assert_ne!(service.generate().plain, service.generate().plain);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Sha256ResetTokenService.digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
