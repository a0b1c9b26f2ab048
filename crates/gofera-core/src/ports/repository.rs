//! Persistence ports.
//!
//! Soft-deleted records are filtered by each query method explicitly; the
//! method names say when inactive rows are included.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Rating, Ride, RideStatus, User};
use crate::error::RepoError;

/// Public ride search filters. All are optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct RideSearch {
    pub start_location: Option<String>,
    pub destination: Option<String>,
    /// Calendar day (UTC) the ride departs on.
    pub date: Option<NaiveDate>,
    pub min_seats: Option<u32>,
    pub max_price: Option<f64>,
}

/// Public user search filters.
#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_driver: Option<bool>,
    pub limit: u64,
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; fails with `Constraint` on a taken email.
    async fn create(&self, user: User) -> Result<User, RepoError>;

    /// Persist changes to an existing user.
    async fn update(&self, user: User) -> Result<User, RepoError>;

    /// Find an active user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find active users by id; missing or inactive ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    /// Find an active user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by email regardless of the soft-delete flag.
    async fn find_by_email_including_inactive(
        &self,
        email: &str,
    ) -> Result<Option<User>, RepoError>;

    /// Whether any account, active or not, holds this email.
    async fn email_taken(&self, email: &str) -> Result<bool, RepoError>;

    /// Find the active user holding an unexpired reset token digest.
    async fn find_by_reset_token(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepoError>;

    async fn list_active(&self) -> Result<Vec<User>, RepoError>;

    async fn list_drivers(&self) -> Result<Vec<User>, RepoError>;

    async fn search(&self, filter: &UserSearch) -> Result<Vec<User>, RepoError>;

    /// Flip the soft-delete flag.
    async fn deactivate(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Ride repository.
///
/// Every mutating method loads the ride, re-applies the domain rule and
/// writes the result as one serialized step, so concurrent callers cannot
/// interleave between check and write.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn create(&self, ride: Ride) -> Result<Ride, RepoError>;

    /// Find a ride that has not been soft-deleted.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ride>, RepoError>;

    /// Active, non-deleted rides matching `filter`, ordered by date then time.
    async fn search(&self, filter: &RideSearch) -> Result<Vec<Ride>, RepoError>;

    /// Non-deleted rides driven by `driver_id`, newest date first.
    async fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, RepoError>;

    /// Non-deleted rides where `user_id` holds a booking, newest date first.
    async fn find_by_passenger(&self, user_id: Uuid) -> Result<Vec<Ride>, RepoError>;

    /// Completed rides where one of the two users drove and the other rode.
    async fn find_completed_shared(&self, a: Uuid, b: Uuid) -> Result<Vec<Ride>, RepoError>;

    /// Whether `user_id` drives or rides on any active ride.
    async fn has_active_involvement(&self, user_id: Uuid) -> Result<bool, RepoError>;

    /// Replace core fields; rejected if passengers booked in the meantime.
    async fn update_unbooked(&self, ride: Ride) -> Result<Ride, RepoError>;

    /// Soft delete; rejected if the ride has passengers.
    async fn soft_delete_unbooked(&self, id: Uuid) -> Result<(), RepoError>;

    /// Append a booking after re-checking eligibility.
    async fn book(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
        seats: u32,
        booked_at: DateTime<Utc>,
    ) -> Result<Ride, RepoError>;

    /// Remove `user_id`'s booking.
    async fn cancel_booking(&self, ride_id: Uuid, user_id: Uuid) -> Result<Ride, RepoError>;

    /// Move an active ride to a terminal status.
    async fn transition(&self, ride_id: Uuid, to: RideStatus) -> Result<Ride, RepoError>;
}

/// Rating repository.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Whether `rater_id` already rated `ratee_id` for `ride_id`.
    async fn exists(&self, rater_id: Uuid, ratee_id: Uuid, ride_id: Uuid)
    -> Result<bool, RepoError>;

    /// Store the rating and fold the score into the ratee's running mean in
    /// one step. Fails with `Constraint` if this rating was already recorded.
    async fn record(&self, rating: Rating) -> Result<User, RepoError>;
}
