//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod notifier;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, ResetToken, ResetTokenService, TokenClaims, TokenService};
pub use notifier::{NotifyError, PasswordResetNotifier};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{RatingRepository, RideRepository, RideSearch, UserRepository, UserSearch};
