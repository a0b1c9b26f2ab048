//! # Gofera Shared
//!
//! Wire types of the HTTP API: request bodies, response views and the
//! `{status, ...}` envelope. Free of server dependencies so a Rust client can
//! reuse them.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
