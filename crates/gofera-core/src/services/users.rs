//! Profile management, discovery, statistics and ratings.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{ProfileChanges, Rating, User, UserStats, VehicleInfo, validate_score};
use crate::error::{DomainError, RepoError};
use crate::ports::{RatingRepository, RideRepository, UserRepository, UserSearch};

pub const SEARCH_LIMIT: u64 = 20;

const ALREADY_RATED: &str = "You have already rated this user for your shared rides";

pub struct UserService {
    users: Arc<dyn UserRepository>,
    rides: Arc<dyn RideRepository>,
    ratings: Arc<dyn RatingRepository>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        rides: Arc<dyn RideRepository>,
        ratings: Arc<dyn RatingRepository>,
    ) -> Self {
        Self {
            users,
            rides,
            ratings,
        }
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    pub async fn update_me(&self, user: &User, changes: ProfileChanges) -> Result<User, DomainError> {
        let mut updated = user.clone();
        updated.apply_profile(changes)?;

        if updated.email != user.email && self.users.email_taken(&updated.email).await? {
            return Err(DomainError::Duplicate("Email already registered".into()));
        }

        let updated = self.users.update(updated).await?;
        tracing::info!(user_id = %updated.id, "Profile updated");
        Ok(updated)
    }

    pub async fn become_driver(
        &self,
        user: &User,
        vehicle: VehicleInfo,
    ) -> Result<User, DomainError> {
        let mut updated = user.clone();
        updated.is_driver = true;
        updated.apply_profile(ProfileChanges {
            vehicle: Some(vehicle),
            ..Default::default()
        })?;

        let updated = self.users.update(updated).await?;
        tracing::info!(user_id = %updated.id, "User became a driver");
        Ok(updated)
    }

    /// Soft-deactivate the caller's account.
    pub async fn deactivate_me(&self, user: &User) -> Result<(), DomainError> {
        if self.rides.has_active_involvement(user.id).await? {
            return Err(DomainError::BusinessRule(
                "Cannot delete account with active rides".into(),
            ));
        }

        self.users.deactivate(user.id).await?;
        tracing::info!(user_id = %user.id, "Account deactivated");
        Ok(())
    }

    pub async fn list_drivers(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.users.list_drivers().await?)
    }

    pub async fn search(
        &self,
        name: Option<String>,
        email: Option<String>,
        is_driver: Option<bool>,
    ) -> Result<Vec<User>, DomainError> {
        let filter = UserSearch {
            name: name.filter(|s| !s.trim().is_empty()),
            email: email.filter(|s| !s.trim().is_empty()),
            is_driver,
            limit: SEARCH_LIMIT,
        };
        Ok(self.users.search(&filter).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.users.list_active().await?)
    }

    pub async fn stats(&self, user: &User) -> Result<UserStats, DomainError> {
        let driven = self.rides.find_by_driver(user.id).await?;
        let joined = self.rides.find_by_passenger(user.id).await?;
        Ok(UserStats::collect(user.id, &driven, &joined))
    }

    /// Rate another user over a completed ride the two shared. Each shared
    /// ride can carry one rating from `rater` to the ratee.
    pub async fn rate(&self, rater: &User, ratee_id: Uuid, score: f64) -> Result<User, DomainError> {
        let score = validate_score(score)?;

        if rater.id == ratee_id {
            return Err(DomainError::Validation("You cannot rate yourself".into()));
        }

        self.get_profile(ratee_id).await?;

        let shared = self.rides.find_completed_shared(rater.id, ratee_id).await?;
        if shared.is_empty() {
            return Err(DomainError::BusinessRule(
                "You can only rate users you have completed rides with".into(),
            ));
        }

        let mut ride_id = None;
        for ride in &shared {
            if !self.ratings.exists(rater.id, ratee_id, ride.id).await? {
                ride_id = Some(ride.id);
                break;
            }
        }
        let ride_id = ride_id.ok_or_else(|| DomainError::BusinessRule(ALREADY_RATED.into()))?;

        let rating = Rating::new(rater.id, ratee_id, ride_id, score);
        let ratee = self.ratings.record(rating).await.map_err(|e| match e {
            RepoError::Constraint(_) => DomainError::BusinessRule(ALREADY_RATED.into()),
            RepoError::NotFound => DomainError::user_not_found(ratee_id),
            other => other.into(),
        })?;

        tracing::info!(rater_id = %rater.id, ratee_id = %ratee_id, %ride_id, score, "User rated");
        Ok(ratee)
    }

    /// Store an opaque push subscription on the caller.
    pub async fn subscribe_push(
        &self,
        user: &User,
        subscription: serde_json::Value,
    ) -> Result<(), DomainError> {
        let mut updated = user.clone();
        updated.push_subscription = Some(subscription);
        updated.updated_at = chrono::Utc::now();
        self.users.update(updated).await?;

        tracing::debug!(user_id = %user.id, "Push subscription stored");
        Ok(())
    }
}
