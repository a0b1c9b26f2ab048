//! # Gofera Infrastructure
//!
//! Concrete implementations of the ports defined in `gofera-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `rate-limit` - Per-key rate limiting via governor
//!
//! The in-memory repositories, JWT/Argon2 auth and the logging reset
//! notifier are always available.

pub mod auth;
pub mod database;
pub mod notifier;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService, Sha256ResetTokenService};
pub use database::InMemoryStore;
pub use notifier::LoggingResetNotifier;

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, DatabaseConnections, PostgresRatingRepository, PostgresRideRepository,
    PostgresUserRepository,
};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
