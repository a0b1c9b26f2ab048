//! In-memory repositories - used when no database is configured and in tests.
//!
//! Every mutating ride operation runs its check and write under the same
//! write lock, which gives the same serialization the row lock gives in
//! PostgreSQL. Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use gofera_core::domain::{Rating, Ride, RideStatus, User};
use gofera_core::error::RepoError;
use gofera_core::ports::{RatingRepository, RideRepository, RideSearch, UserRepository, UserSearch};

/// One store backing all three repository ports.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    rides: RwLock<HashMap<Uuid, Ride>>,
    ratings: RwLock<Vec<Rating>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate_ride<T>(
        &self,
        id: Uuid,
        op: impl FnOnce(&mut Ride) -> Result<T, RepoError>,
    ) -> Result<Ride, RepoError> {
        let mut rides = self.rides.write().await;
        let stored = rides
            .get_mut(&id)
            .filter(|r| r.active)
            .ok_or(RepoError::NotFound)?;

        // Work on a copy so a rejected operation leaves the stored ride as is.
        let mut ride = stored.clone();
        op(&mut ride)?;
        *stored = ride.clone();
        Ok(ride)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

fn newest_first(rides: &mut [Ride]) {
    rides.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.time.cmp(&a.time)));
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("users.email".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepoError::Constraint("users.email".into()));
        }
        let slot = users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.active).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id))
            .filter(|u| u.active)
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.active && u.email == email)
            .cloned())
    }

    async fn find_by_email_including_inactive(
        &self,
        email: &str,
    ) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email))
    }

    async fn find_by_reset_token(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| {
                u.active
                    && u.password_reset_token.as_deref() == Some(digest)
                    && u.password_reset_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>, RepoError> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users.values().filter(|u| u.active).cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn list_drivers(&self) -> Result<Vec<User>, RepoError> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users
            .values()
            .filter(|u| u.active && u.is_driver)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(list)
    }

    async fn search(&self, filter: &UserSearch) -> Result<Vec<User>, RepoError> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users
            .values()
            .filter(|u| u.active)
            .filter(|u| filter.name.as_deref().is_none_or(|n| contains_ci(&u.name, n)))
            .filter(|u| {
                filter
                    .email
                    .as_deref()
                    .is_none_or(|e| contains_ci(&u.email, e))
            })
            .filter(|u| filter.is_driver.is_none_or(|d| u.is_driver == d))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list.truncate(filter.limit as usize);
        Ok(list)
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.active = false;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl RideRepository for InMemoryStore {
    async fn create(&self, ride: Ride) -> Result<Ride, RepoError> {
        let mut rides = self.rides.write().await;
        rides.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ride>, RepoError> {
        let rides = self.rides.read().await;
        Ok(rides.get(&id).filter(|r| r.active).cloned())
    }

    async fn search(&self, filter: &RideSearch) -> Result<Vec<Ride>, RepoError> {
        let rides = self.rides.read().await;
        let mut list: Vec<Ride> = rides
            .values()
            .filter(|r| r.active && r.status == RideStatus::Active)
            .filter(|r| {
                filter
                    .start_location
                    .as_deref()
                    .is_none_or(|s| contains_ci(&r.start_location, s))
            })
            .filter(|r| {
                filter
                    .destination
                    .as_deref()
                    .is_none_or(|d| contains_ci(&r.destination, d))
            })
            .filter(|r| filter.date.is_none_or(|day| r.date.date_naive() == day))
            .filter(|r| {
                filter
                    .min_seats
                    .is_none_or(|min| r.remaining_seats() >= i64::from(min))
            })
            .filter(|r| filter.max_price.is_none_or(|max| r.price <= max))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        Ok(list)
    }

    async fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, RepoError> {
        let rides = self.rides.read().await;
        let mut list: Vec<Ride> = rides
            .values()
            .filter(|r| r.active && r.driver_id == driver_id)
            .cloned()
            .collect();
        newest_first(&mut list);
        Ok(list)
    }

    async fn find_by_passenger(&self, user_id: Uuid) -> Result<Vec<Ride>, RepoError> {
        let rides = self.rides.read().await;
        let mut list: Vec<Ride> = rides
            .values()
            .filter(|r| r.active && r.booking_for(user_id).is_some())
            .cloned()
            .collect();
        newest_first(&mut list);
        Ok(list)
    }

    async fn find_completed_shared(&self, a: Uuid, b: Uuid) -> Result<Vec<Ride>, RepoError> {
        let rides = self.rides.read().await;
        let mut list: Vec<Ride> = rides
            .values()
            .filter(|r| r.status == RideStatus::Completed)
            .filter(|r| {
                (r.driver_id == a && r.booking_for(b).is_some())
                    || (r.driver_id == b && r.booking_for(a).is_some())
            })
            .cloned()
            .collect();
        list.sort_by(|x, y| x.date.cmp(&y.date));
        Ok(list)
    }

    async fn has_active_involvement(&self, user_id: Uuid) -> Result<bool, RepoError> {
        let rides = self.rides.read().await;
        Ok(rides
            .values()
            .any(|r| r.active && r.status == RideStatus::Active && r.involves(user_id)))
    }

    async fn update_unbooked(&self, ride: Ride) -> Result<Ride, RepoError> {
        self.mutate_ride(ride.id, |current| {
            current.check_editable()?;
            *current = Ride {
                passengers: std::mem::take(&mut current.passengers),
                status: current.status,
                active: current.active,
                driver_id: current.driver_id,
                created_at: current.created_at,
                ..ride
            };
            Ok(())
        })
        .await
    }

    async fn soft_delete_unbooked(&self, id: Uuid) -> Result<(), RepoError> {
        self.mutate_ride(id, |ride| Ok(ride.soft_delete()?)).await?;
        Ok(())
    }

    async fn book(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
        seats: u32,
        booked_at: DateTime<Utc>,
    ) -> Result<Ride, RepoError> {
        self.mutate_ride(ride_id, |ride| {
            ride.book(user_id, seats, booked_at)?;
            Ok(())
        })
        .await
    }

    async fn cancel_booking(&self, ride_id: Uuid, user_id: Uuid) -> Result<Ride, RepoError> {
        self.mutate_ride(ride_id, |ride| Ok(ride.cancel_booking(user_id)?))
            .await
    }

    async fn transition(&self, ride_id: Uuid, to: RideStatus) -> Result<Ride, RepoError> {
        self.mutate_ride(ride_id, |ride| Ok(ride.transition(to)?))
            .await
    }
}

#[async_trait]
impl RatingRepository for InMemoryStore {
    async fn exists(
        &self,
        rater_id: Uuid,
        ratee_id: Uuid,
        ride_id: Uuid,
    ) -> Result<bool, RepoError> {
        let ratings = self.ratings.read().await;
        Ok(ratings
            .iter()
            .any(|r| r.rater_id == rater_id && r.ratee_id == ratee_id && r.ride_id == ride_id))
    }

    async fn record(&self, rating: Rating) -> Result<User, RepoError> {
        // Lock order: ratings, then users.
        let mut ratings = self.ratings.write().await;
        if ratings.iter().any(|r| {
            r.rater_id == rating.rater_id
                && r.ratee_id == rating.ratee_id
                && r.ride_id == rating.ride_id
        }) {
            return Err(RepoError::Constraint("ratings.rater_ratee_ride".into()));
        }

        let mut users = self.users.write().await;
        let ratee = users
            .get_mut(&rating.ratee_id)
            .filter(|u| u.active)
            .ok_or(RepoError::NotFound)?;
        ratee.apply_rating(rating.score);
        let ratee = ratee.clone();

        ratings.push(rating);
        Ok(ratee)
    }
}
