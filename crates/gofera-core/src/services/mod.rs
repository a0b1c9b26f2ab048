//! Application services orchestrating domain rules over the ports.

mod auth;
mod rides;
mod users;

pub use auth::{AuthService, Session, SignupInput, require_driver, restrict_to};
pub use rides::{MyRidesRole, RideService};
pub use users::{SEARCH_LIMIT, UserService};
