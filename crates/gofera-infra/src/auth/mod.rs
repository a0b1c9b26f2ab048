//! Authentication implementations.

mod jwt;
mod password;
mod reset_token;

pub use jwt::{JwtConfig, JwtTokenService};
pub use password::Argon2PasswordService;
pub use reset_token::Sha256ResetTokenService;
