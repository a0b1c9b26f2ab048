//! Domain entities - the core business objects.

mod rating;
mod ride;
mod stats;
mod user;

pub use rating::{MAX_SCORE, MIN_SCORE, Rating, validate_score};
pub use ride::{
    Booking, MAX_SEATS, MIN_SEATS, NewRide, PickupPoint, Restrictions, Ride, RideChanges,
    RideStatus, RuleViolation, normalize_time,
};
pub use stats::{DriverRideStats, StatusBucket, UserStats};
pub use user::{
    MIN_PASSWORD_LEN, NewUser, ProfileChanges, User, UserRole, VehicleInfo, mask_email,
    normalize_email, validate_password,
};
