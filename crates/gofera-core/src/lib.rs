//! # Gofera Core
//!
//! Domain layer of the Gofera ride-sharing service: rides and their booking
//! rules, users, ratings, the ports infrastructure implements, and the
//! services the HTTP layer calls.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
